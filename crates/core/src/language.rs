//! Target-language handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language a learner is practicing
///
/// Drives scoring locale and the phrasing of generated feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
    Italian,
    Portuguese,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
            Language::Portuguese => "pt",
        }
    }

    /// English display name (used in prompts)
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
        }
    }

    /// Parse an ISO 639-1 code or a lowercase language name
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::English),
            "es" | "spanish" => Some(Language::Spanish),
            "fr" | "french" => Some(Language::French),
            "de" | "german" => Some(Language::German),
            "it" | "italian" => Some(Language::Italian),
            "pt" | "portuguese" => Some(Language::Portuguese),
            _ => None,
        }
    }

    /// All supported languages
    pub fn all() -> &'static [Language] {
        &[
            Language::English,
            Language::Spanish,
            Language::French,
            Language::German,
            Language::Italian,
            Language::Portuguese,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for lang in Language::all() {
            assert_eq!(Language::from_code(lang.code()), Some(*lang));
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Language::from_code("Spanish"), Some(Language::Spanish));
        assert_eq!(Language::from_code("xx"), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Language::French).unwrap();
        assert_eq!(json, "\"french\"");
        let lang: Language = serde_json::from_str("\"german\"").unwrap();
        assert_eq!(lang, Language::German);
    }
}
