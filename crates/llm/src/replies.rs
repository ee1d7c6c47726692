//! Free-form conversational replies
//!
//! Generates a tutor reply between scored turns so dialogue mode can answer
//! the learner off-script. Length sanity follows the same keep-it-spoken
//! rule the prompt asks for.

use std::sync::Arc;

use lingua_tutor_core::{GenerateRequest, Language, LanguageModel, Message, Result};

use crate::prompt::PromptBuilder;

/// Reply generation configuration
#[derive(Debug, Clone)]
pub struct ReplierConfig {
    /// Token budget for the reply
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Prompt token budget before history truncation kicks in
    pub context_tokens: usize,
}

impl Default for ReplierConfig {
    fn default() -> Self {
        Self {
            max_tokens: 128,
            temperature: 0.7,
            context_tokens: 2048,
        }
    }
}

/// Generates conversational tutor replies
pub struct ConversationReplier {
    llm: Arc<dyn LanguageModel>,
    config: ReplierConfig,
}

impl ConversationReplier {
    /// Create a new replier
    pub fn new(llm: Arc<dyn LanguageModel>, config: ReplierConfig) -> Self {
        Self { llm, config }
    }

    /// Generate a reply to the learner's message
    pub async fn reply(
        &self,
        language: Language,
        level: &str,
        scenario_context: Option<&str>,
        history: &[Message],
        learner_message: &str,
    ) -> Result<String> {
        let messages = PromptBuilder::new()
            .system_prompt(language, level)
            .with_scenario_context(scenario_context.unwrap_or(""))
            .with_history(history)
            .user_message(learner_message)
            .build_with_limit(self.config.context_tokens);

        let request = GenerateRequest {
            messages,
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            json_output: false,
        };

        let response = self.llm.generate(request).await?;
        let reply = response.text.trim().to_string();

        tracing::debug!(
            backend = self.llm.name(),
            chars = reply.len(),
            "conversation reply generated"
        );

        Ok(reply)
    }
}
