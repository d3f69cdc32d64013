//! Top-K selection over the global count.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::counter::TokenCounts;

/// A token with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// The highest-count tokens, ordered by count descending.
///
/// Serializes as a `{ token: count }` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopWords {
    entries: Vec<WordCount>,
}

impl TopWords {
    /// Ranked entries, highest count first.
    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.word == word)
            .map(|e| e.count)
    }

    /// The selection as a token-sorted mapping.
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        self.entries
            .iter()
            .map(|e| (e.word.clone(), e.count))
            .collect()
    }
}

impl Serialize for TopWords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Count descending, then token ascending.
fn rank(a: &WordCount, b: &WordCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word))
}

/// Select the `n` most frequent tokens.
///
/// Returns an empty selection when `n <= 0` or `counts` is empty. Tokens
/// with equal counts are ordered lexicographically, so the cut-off is
/// deterministic.
pub fn select_top(counts: &TokenCounts, n: i64) -> TopWords {
    if n <= 0 || counts.is_empty() {
        return TopWords::default();
    }
    let n = usize::try_from(n).unwrap_or(usize::MAX);

    let mut entries: Vec<WordCount> = counts
        .iter()
        .map(|(word, count)| WordCount {
            word: word.clone(),
            count: *count,
        })
        .collect();

    if n < entries.len() {
        entries.select_nth_unstable_by(n, rank);
        entries.truncate(n);
    }
    entries.sort_unstable_by(rank);

    TopWords { entries }
}
