//! Learner profile storage

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use lingua_tutor_core::Language;

use crate::{PersistenceError, ScyllaClient};

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "premium" => Some(Plan::Premium),
            _ => None,
        }
    }
}

/// Learner profile row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub learner_id: String,
    pub display_name: Option<String>,
    pub learning_language: Language,
    /// CEFR level the learner is working at
    pub level: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearnerProfile {
    pub fn new(learner_id: &str, learning_language: Language) -> Self {
        let now = Utc::now();
        Self {
            learner_id: learner_id.to_string(),
            display_name: None,
            learning_language,
            level: "A1".to_string(),
            plan: Plan::Free,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Learner store trait for abstraction
#[async_trait]
pub trait LearnerStore: Send + Sync {
    async fn get(&self, learner_id: &str) -> Result<Option<LearnerProfile>, PersistenceError>;
    async fn upsert(&self, profile: &LearnerProfile) -> Result<(), PersistenceError>;
    async fn delete(&self, learner_id: &str) -> Result<(), PersistenceError>;
}

/// ScyllaDB implementation of the learner store
#[derive(Clone)]
pub struct ScyllaLearnerStore {
    client: ScyllaClient,
}

impl ScyllaLearnerStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LearnerStore for ScyllaLearnerStore {
    async fn get(&self, learner_id: &str) -> Result<Option<LearnerProfile>, PersistenceError> {
        let query = format!(
            "SELECT learner_id, display_name, learning_language, level, plan,
                    created_at, updated_at
             FROM {}.learners WHERE learner_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (learner_id,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (learner_id, display_name, learning_language, level, plan, created_at, updated_at): (
                    String,
                    Option<String>,
                    String,
                    String,
                    String,
                    i64,
                    i64,
                ) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                let learning_language = Language::from_code(&learning_language).ok_or_else(|| {
                    PersistenceError::InvalidData(format!(
                        "unknown learning language: {}",
                        learning_language
                    ))
                })?;
                let plan = Plan::from_str_loose(&plan)
                    .ok_or_else(|| PersistenceError::InvalidData(format!("unknown plan: {}", plan)))?;

                return Ok(Some(LearnerProfile {
                    learner_id,
                    display_name,
                    learning_language,
                    level,
                    plan,
                    created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
                    updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
                }));
            }
        }

        Ok(None)
    }

    async fn upsert(&self, profile: &LearnerProfile) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.learners (
                learner_id, display_name, learning_language, level, plan,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &profile.learner_id,
                    &profile.display_name,
                    profile.learning_language.code(),
                    &profile.level,
                    profile.plan.as_str(),
                    profile.created_at.timestamp_millis(),
                    Utc::now().timestamp_millis(),
                ),
            )
            .await?;

        tracing::debug!(learner_id = %profile.learner_id, "Learner upserted");
        Ok(())
    }

    async fn delete(&self, learner_id: &str) -> Result<(), PersistenceError> {
        let query = format!(
            "DELETE FROM {}.learners WHERE learner_id = ?",
            self.client.keyspace()
        );

        self.client.session().query_unpaged(query, (learner_id,)).await?;
        tracing::debug!(%learner_id, "Learner deleted");
        Ok(())
    }
}

/// In-memory implementation for tests and single-node development
#[derive(Default)]
pub struct InMemoryLearnerStore {
    learners: RwLock<HashMap<String, LearnerProfile>>,
}

impl InMemoryLearnerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LearnerStore for InMemoryLearnerStore {
    async fn get(&self, learner_id: &str) -> Result<Option<LearnerProfile>, PersistenceError> {
        Ok(self.learners.read().get(learner_id).cloned())
    }

    async fn upsert(&self, profile: &LearnerProfile) -> Result<(), PersistenceError> {
        let mut updated = profile.clone();
        updated.updated_at = Utc::now();
        self.learners
            .write()
            .insert(profile.learner_id.clone(), updated);
        Ok(())
    }

    async fn delete(&self, learner_id: &str) -> Result<(), PersistenceError> {
        self.learners.write().remove(learner_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let profile = LearnerProfile::new("learner-1", Language::Spanish);
        assert_eq!(profile.level, "A1");
        assert_eq!(profile.plan, Plan::Free);
    }

    #[test]
    fn test_plan_round_trip() {
        for plan in [Plan::Free, Plan::Premium] {
            assert_eq!(Plan::from_str_loose(plan.as_str()), Some(plan));
        }
        assert_eq!(Plan::from_str_loose("enterprise"), None);
    }

    #[tokio::test]
    async fn test_in_memory_crud() {
        let store = InMemoryLearnerStore::new();
        let profile = LearnerProfile::new("learner-1", Language::French);

        assert!(store.get("learner-1").await.unwrap().is_none());

        store.upsert(&profile).await.unwrap();
        let fetched = store.get("learner-1").await.unwrap().unwrap();
        assert_eq!(fetched.learning_language, Language::French);

        store.delete("learner-1").await.unwrap();
        assert!(store.get("learner-1").await.unwrap().is_none());
    }
}
