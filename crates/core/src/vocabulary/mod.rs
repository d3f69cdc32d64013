//! Reference vocabulary and token validation.

mod loader;
mod validator;

pub use loader::{load_vocabulary, Vocabulary};
pub use validator::{TokenValidator, VocabularyValidator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read vocabulary {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
