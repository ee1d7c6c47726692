//! Persistence layer for lingua-tutor
//!
//! Provides storage for:
//! - Learner profiles (identity, learning language, plan)
//! - Scored attempts (progress history)
//!
//! Stores are trait-first: ScyllaDB implementations for deployments, and
//! in-memory twins so tests and single-node development need no cluster.

pub mod client;
pub mod entitlement;
pub mod error;
pub mod learners;
pub mod progress;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use entitlement::PlanEntitlements;
pub use error::PersistenceError;
pub use learners::{InMemoryLearnerStore, LearnerProfile, LearnerStore, Plan, ScyllaLearnerStore};
pub use progress::{AttemptRecord, InMemoryProgressStore, ProgressStore, ScyllaProgressStore};

use std::sync::Arc;

/// Combined persistence layer
pub struct PersistenceLayer {
    pub learners: Arc<dyn LearnerStore>,
    pub progress: Arc<dyn ProgressStore>,
}

/// Initialize the persistence layer with ScyllaDB
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        learners: Arc::new(ScyllaLearnerStore::new(client.clone())),
        progress: Arc::new(ScyllaProgressStore::new(client)),
    })
}

/// Initialize an in-memory persistence layer
pub fn init_in_memory() -> PersistenceLayer {
    PersistenceLayer {
        learners: Arc::new(InMemoryLearnerStore::new()),
        progress: Arc::new(InMemoryProgressStore::new()),
    }
}
