//! Errors surfaced by the reader-facing operations.
//!
//! Each library seam has its own typed error in `lectio_core::error`;
//! [`ReaderError`] joins them for callers that drive several components.

use lectio_core::error::{LoadError, SelectionError, SpeechError, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReaderError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
}
