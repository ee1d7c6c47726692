//! Prompt building for tutoring conversations

use lingua_tutor_core::{Language, Message};

/// Builds message lists for the conversational tutor
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// System prompt for a language tutor persona
    pub fn system_prompt(mut self, language: Language, level: &str) -> Self {
        let system = format!(
            r#"You are a friendly {language} tutor having a spoken practice conversation with a learner at roughly CEFR level {level}.

## Your Role
- Keep the conversation going in {language}
- Use vocabulary and grammar appropriate for {level}
- Gently recast the learner's mistakes instead of correcting them explicitly
- Encourage the learner to keep speaking

## Response Format
Respond naturally as if speaking. Keep replies to one or two short sentences. Do not use bullet points, headers, or markdown formatting."#,
            language = language.display_name(),
            level = level,
        );

        self.messages.push(Message::system(system));
        self
    }

    /// Add scenario context so replies stay on script
    pub fn with_scenario_context(mut self, context: &str) -> Self {
        if !context.is_empty() {
            self.messages.push(Message::system(format!(
                "## Scenario\nThe conversation follows this situation:\n{}",
                context
            )));
        }
        self
    }

    /// Add conversation history
    pub fn with_history(mut self, history: &[Message]) -> Self {
        self.messages.extend(history.iter().cloned());
        self
    }

    /// Add the learner's current message
    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    /// Build the final message list
    pub fn build(self) -> Vec<Message> {
        self.messages
    }

    /// Build, truncating history to fit a token budget
    ///
    /// System messages are always kept; the oldest conversation messages are
    /// dropped first.
    pub fn build_with_limit(self, max_tokens: usize) -> Vec<Message> {
        if self.estimate_tokens() <= max_tokens {
            return self.messages;
        }

        let (system_msgs, conv_msgs): (Vec<_>, Vec<_>) = self
            .messages
            .into_iter()
            .partition(|m| matches!(m.role, lingua_tutor_core::Role::System));

        let system_tokens: usize = system_msgs.iter().map(|m| estimate_message_tokens(m)).sum();
        let available = max_tokens.saturating_sub(system_tokens);

        let mut kept: Vec<Message> = Vec::new();
        let mut used = 0;
        for msg in conv_msgs.into_iter().rev() {
            let tokens = estimate_message_tokens(&msg);
            if used + tokens <= available {
                used += tokens;
                kept.push(msg);
            } else {
                break;
            }
        }
        kept.reverse();

        let mut result = system_msgs;
        result.extend(kept);
        result
    }

    /// Get message count
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Rough token estimate over all messages
    pub fn estimate_tokens(&self) -> usize {
        self.messages.iter().map(estimate_message_tokens).sum()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Four characters per token is close enough for budgeting in the
// Latin-script languages we support.
fn estimate_message_tokens(message: &Message) -> usize {
    message.content.chars().count().max(1) / 4
}

/// Canned replies for moments that need no model call
pub struct ResponseTemplates;

impl ResponseTemplates {
    /// Encouragement after a passed turn
    pub fn encouragement(language: Language) -> &'static str {
        match language {
            Language::English => "Great job! Let's keep going.",
            Language::Spanish => "¡Muy bien! Sigamos.",
            Language::French => "Très bien ! Continuons.",
            Language::German => "Sehr gut! Weiter geht's.",
            Language::Italian => "Ottimo! Continuiamo.",
            Language::Portuguese => "Muito bem! Vamos continuar.",
        }
    }

    /// Invitation to try the line again
    pub fn try_again(language: Language) -> &'static str {
        match language {
            Language::English => "Almost! Try saying it one more time.",
            Language::Spanish => "¡Casi! Inténtalo una vez más.",
            Language::French => "Presque ! Essaie encore une fois.",
            Language::German => "Fast! Versuch es noch einmal.",
            Language::Italian => "Quasi! Prova ancora una volta.",
            Language::Portuguese => "Quase! Tenta mais uma vez.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_first() {
        let messages = PromptBuilder::new()
            .system_prompt(Language::Spanish, "A1")
            .user_message("Hola")
            .build();

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("Spanish"));
        assert!(messages[0].content.contains("A1"));
    }

    #[test]
    fn test_scenario_context_skipped_when_empty() {
        let builder = PromptBuilder::new()
            .system_prompt(Language::English, "A2")
            .with_scenario_context("");
        assert_eq!(builder.message_count(), 1);
    }

    #[test]
    fn test_build_with_limit_keeps_system_and_recent() {
        let history: Vec<Message> = (0..20)
            .map(|i| Message::user(format!("message number {} with some padding text", i)))
            .collect();

        let messages = PromptBuilder::new()
            .system_prompt(Language::English, "B1")
            .with_history(&history)
            .user_message("latest")
            .build_with_limit(200);

        // System prompt survives
        assert!(matches!(messages[0].role, lingua_tutor_core::Role::System));
        // The newest message survives
        assert_eq!(messages.last().unwrap().content, "latest");
        // Something was dropped
        assert!(messages.len() < 22);
    }

    #[test]
    fn test_templates_cover_all_languages() {
        for language in Language::all() {
            assert!(!ResponseTemplates::encouragement(*language).is_empty());
            assert!(!ResponseTemplates::try_again(*language).is_empty());
        }
    }
}
