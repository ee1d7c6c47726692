//! Attempt history storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use lingua_tutor_core::PronunciationFeedback;

use crate::{PersistenceError, ScyllaClient};

/// A recorded scoring attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub learner_id: String,
    pub scenario_id: String,
    pub turn_index: u32,
    pub overall_score: u8,
    pub passed: bool,
    /// Full feedback object, serialized
    pub feedback_json: String,
    pub attempted_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Build a record from a complete feedback object
    ///
    /// Only called after the pipeline produced a full result; a partial
    /// attempt is never persisted.
    pub fn new(
        learner_id: &str,
        scenario_id: &str,
        turn_index: u32,
        passed: bool,
        feedback: &PronunciationFeedback,
    ) -> Result<Self, PersistenceError> {
        Ok(Self {
            learner_id: learner_id.to_string(),
            scenario_id: scenario_id.to_string(),
            turn_index,
            overall_score: feedback.overall_score,
            passed,
            feedback_json: serde_json::to_string(feedback)?,
            attempted_at: Utc::now(),
        })
    }

    /// Deserialize the stored feedback
    pub fn feedback(&self) -> Result<PronunciationFeedback, PersistenceError> {
        Ok(serde_json::from_str(&self.feedback_json)?)
    }
}

/// Progress store trait for abstraction
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), PersistenceError>;
    async fn list_attempts(
        &self,
        learner_id: &str,
        scenario_id: &str,
        limit: i32,
    ) -> Result<Vec<AttemptRecord>, PersistenceError>;
}

/// ScyllaDB implementation of the progress store
#[derive(Clone)]
pub struct ScyllaProgressStore {
    client: ScyllaClient,
}

impl ScyllaProgressStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProgressStore for ScyllaProgressStore {
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.attempts (
                learner_id, scenario_id, attempted_at,
                turn_index, overall_score, passed, feedback_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &attempt.learner_id,
                    &attempt.scenario_id,
                    attempt.attempted_at.timestamp_millis(),
                    attempt.turn_index as i32,
                    attempt.overall_score as i32,
                    attempt.passed,
                    &attempt.feedback_json,
                ),
            )
            .await?;

        tracing::debug!(
            learner_id = %attempt.learner_id,
            scenario_id = %attempt.scenario_id,
            turn = attempt.turn_index,
            "Attempt recorded"
        );
        Ok(())
    }

    async fn list_attempts(
        &self,
        learner_id: &str,
        scenario_id: &str,
        limit: i32,
    ) -> Result<Vec<AttemptRecord>, PersistenceError> {
        let query = format!(
            "SELECT learner_id, scenario_id, attempted_at,
                    turn_index, overall_score, passed, feedback_json
             FROM {}.attempts WHERE learner_id = ? AND scenario_id = ? LIMIT ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (learner_id, scenario_id, limit))
            .await?;

        let mut attempts = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (learner_id, scenario_id, attempted_at, turn_index, overall_score, passed, feedback_json): (
                    String,
                    String,
                    i64,
                    i32,
                    i32,
                    bool,
                    String,
                ) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                attempts.push(AttemptRecord {
                    learner_id,
                    scenario_id,
                    turn_index: turn_index.max(0) as u32,
                    overall_score: overall_score.clamp(0, 100) as u8,
                    passed,
                    feedback_json,
                    attempted_at: DateTime::from_timestamp_millis(attempted_at)
                        .unwrap_or_else(Utc::now),
                });
            }
        }

        Ok(attempts)
    }
}

/// In-memory implementation for tests and single-node development
#[derive(Default)]
pub struct InMemoryProgressStore {
    attempts: RwLock<Vec<AttemptRecord>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored attempts
    pub fn len(&self) -> usize {
        self.attempts.read().len()
    }

    /// Whether any attempts are stored
    pub fn is_empty(&self) -> bool {
        self.attempts.read().is_empty()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn record_attempt(&self, attempt: &AttemptRecord) -> Result<(), PersistenceError> {
        self.attempts.write().push(attempt.clone());
        Ok(())
    }

    async fn list_attempts(
        &self,
        learner_id: &str,
        scenario_id: &str,
        limit: i32,
    ) -> Result<Vec<AttemptRecord>, PersistenceError> {
        let attempts = self.attempts.read();
        let mut matching: Vec<AttemptRecord> = attempts
            .iter()
            .filter(|a| a.learner_id == learner_id && a.scenario_id == scenario_id)
            .cloned()
            .collect();
        // Newest first, matching the ScyllaDB clustering order
        matching.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }
}
