//! Keyspace and table creation

use scylla::Session;

use crate::error::PersistenceError;

/// Create the keyspace if it does not exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, ())
        .await
        .map_err(|e| PersistenceError::SchemaError(e.to_string()))?;

    Ok(())
}

/// Create tables if they do not exist
pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    let learners = format!(
        "CREATE TABLE IF NOT EXISTS {}.learners (
            learner_id text PRIMARY KEY,
            display_name text,
            learning_language text,
            level text,
            plan text,
            created_at bigint,
            updated_at bigint
        )",
        keyspace
    );

    // Attempts cluster newest-first under (learner, scenario)
    let attempts = format!(
        "CREATE TABLE IF NOT EXISTS {}.attempts (
            learner_id text,
            scenario_id text,
            attempted_at bigint,
            turn_index int,
            overall_score int,
            passed boolean,
            feedback_json text,
            PRIMARY KEY ((learner_id, scenario_id), attempted_at)
        ) WITH CLUSTERING ORDER BY (attempted_at DESC)",
        keyspace
    );

    for query in [learners, attempts] {
        session
            .query_unpaged(query, ())
            .await
            .map_err(|e| PersistenceError::SchemaError(e.to_string()))?;
    }

    Ok(())
}
