use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::Vocabulary;

/// At least three ASCII word characters and nothing else.
static WORD_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w{3,}$").unwrap());

/// Decides whether a token should be counted.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> bool;
}

/// Accepts tokens of at least three word characters that are present in
/// the vocabulary.
#[derive(Debug, Clone)]
pub struct VocabularyValidator {
    vocabulary: Arc<Vocabulary>,
}

impl VocabularyValidator {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

impl TokenValidator for VocabularyValidator {
    fn validate(&self, token: &str) -> bool {
        WORD_SHAPE.is_match(token) && self.vocabulary.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(words: &[&str]) -> VocabularyValidator {
        VocabularyValidator::new(Arc::new(Vocabulary::from_words(words)))
    }

    #[test]
    fn test_accepts_known_words() {
        let v = validator(&["alpha", "beta", "the"]);
        assert!(v.validate("alpha"));
        assert!(v.validate("beta"));
        assert!(v.validate("the"));
    }

    #[test]
    fn test_rejects_short_tokens_even_if_in_vocabulary() {
        let v = validator(&["a", "to", "the"]);
        assert!(!v.validate("a"));
        assert!(!v.validate("to"));
        assert!(v.validate("the"));
    }

    #[test]
    fn test_rejects_non_word_characters() {
        let v = validator(&["don't", "e-mail", "café", "hello world", "ok!"]);
        assert!(!v.validate("don't"));
        assert!(!v.validate("e-mail"));
        assert!(!v.validate("café"));
        assert!(!v.validate("hello world"));
        assert!(!v.validate("ok!"));
    }

    #[test]
    fn test_rejects_unknown_words() {
        let v = validator(&["alpha"]);
        assert!(!v.validate("gamma"));
        assert!(!v.validate("Alpha"));
    }

    #[test]
    fn test_accepts_digits_and_underscores() {
        let v = validator(&["abc_123", "2024"]);
        assert!(v.validate("abc_123"));
        assert!(v.validate("2024"));
    }

    #[test]
    fn test_rejection_holds_for_large_vocabulary() {
        let mut words: Vec<String> = (0..10_000).map(|i| format!("word{i}")).collect();
        words.push("xy".to_string());
        let v = VocabularyValidator::new(Arc::new(Vocabulary::from_words(&words)));

        assert!(v.validate("word42"));
        assert!(!v.validate("xy"));
        assert!(!v.validate("word-42"));
        assert!(!v.validate("missing"));
    }
}
