//! Token normalization shared by both scoring paths

/// Normalize a token for comparison: lowercase, strip trailing `.,!?`
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(token: &str) -> String {
    token
        .trim_end_matches(['.', ',', '!', '?'])
        .to_lowercase()
}

/// Split text on whitespace
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips() {
        assert_eq!(normalize("Hello!"), "hello");
        assert_eq!(normalize("WORLD."), "world");
        assert_eq!(normalize("oui,"), "oui");
        assert_eq!(normalize("what?!"), "what");
    }

    #[test]
    fn test_normalize_keeps_interior_punctuation() {
        assert_eq!(normalize("l'ami"), "l'ami");
        assert_eq!(normalize("qu'est-ce"), "qu'est-ce");
    }

    #[test]
    fn test_normalize_idempotent() {
        for token in ["Hello!", "WORLD.", "déjà,", "¿qué?", "plain"] {
            let once = normalize(token);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  hola   amigo \t mío "), vec!["hola", "amigo", "mío"]);
        assert!(tokenize("   ").is_empty());
    }
}
