use std::collections::HashSet;
use std::path::Path;

use super::VocabularyError;

/// Immutable set of accepted tokens.
///
/// Built once before a run and shared read-only between workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    /// Build a vocabulary from in-memory words.
    ///
    /// Words are trimmed; blank entries are skipped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .filter_map(|w| {
                let w = w.as_ref().trim();
                (!w.is_empty()).then(|| w.to_string())
            })
            .collect();
        Self { words }
    }

    /// Parse a line-oriented source: one word per line.
    pub fn parse(source: &str) -> Self {
        Self::from_words(source.lines())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Load the vocabulary file at `path`.
///
/// Any read failure, including invalid UTF-8, is returned as an error; no
/// partial vocabulary is produced.
pub async fn load_vocabulary(path: &Path) -> Result<Vocabulary, VocabularyError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| VocabularyError::Read {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Vocabulary::parse(&source))
}
