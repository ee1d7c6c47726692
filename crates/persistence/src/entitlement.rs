//! Plan-based entitlement checks

use std::sync::Arc;

use async_trait::async_trait;

use lingua_tutor_core::{EntitlementCheck, Feature, Result};

use crate::learners::{LearnerStore, Plan};

/// Entitlement gate driven by the learner's plan
///
/// Unknown learners are treated as free-plan users so first requests work
/// before a profile row exists.
pub struct PlanEntitlements {
    learners: Arc<dyn LearnerStore>,
}

impl PlanEntitlements {
    pub fn new(learners: Arc<dyn LearnerStore>) -> Self {
        Self { learners }
    }

    fn plan_allows(plan: Plan, feature: Feature) -> bool {
        match plan {
            Plan::Premium => true,
            Plan::Free => matches!(feature, Feature::SentencePractice | Feature::Speech),
        }
    }
}

#[async_trait]
impl EntitlementCheck for PlanEntitlements {
    async fn has_access(&self, learner_id: &str, feature: Feature) -> Result<bool> {
        let plan = match self.learners.get(learner_id).await? {
            Some(profile) => profile.plan,
            None => {
                tracing::debug!(%learner_id, "no profile, assuming free plan");
                Plan::Free
            }
        };

        Ok(Self::plan_allows(plan, feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learners::{InMemoryLearnerStore, LearnerProfile};
    use lingua_tutor_core::Language;

    #[tokio::test]
    async fn test_free_plan_matrix() {
        let store = Arc::new(InMemoryLearnerStore::new());
        let mut profile = LearnerProfile::new("free-user", Language::English);
        profile.plan = Plan::Free;
        store.upsert(&profile).await.unwrap();

        let check = PlanEntitlements::new(store);
        assert!(check.has_access("free-user", Feature::SentencePractice).await.unwrap());
        assert!(check.has_access("free-user", Feature::Speech).await.unwrap());
        assert!(!check.has_access("free-user", Feature::Dialogue).await.unwrap());
        assert!(!check.has_access("free-user", Feature::Conversation).await.unwrap());
    }

    #[tokio::test]
    async fn test_premium_plan_unlocks_all() {
        let store = Arc::new(InMemoryLearnerStore::new());
        let mut profile = LearnerProfile::new("premium-user", Language::German);
        profile.plan = Plan::Premium;
        store.upsert(&profile).await.unwrap();

        let check = PlanEntitlements::new(store);
        for feature in [
            Feature::SentencePractice,
            Feature::Speech,
            Feature::Dialogue,
            Feature::Conversation,
        ] {
            assert!(check.has_access("premium-user", feature).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_unknown_learner_defaults_to_free() {
        let check = PlanEntitlements::new(Arc::new(InMemoryLearnerStore::new()));
        assert!(check.has_access("ghost", Feature::SentencePractice).await.unwrap());
        assert!(!check.has_access("ghost", Feature::Dialogue).await.unwrap());
    }
}
