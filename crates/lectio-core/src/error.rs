//! Error taxonomy shared by every Lectio component.
//!
//! | Error | Raised by |
//! |-------|-----------|
//! | [`LoadError`] | content sources (translation list, metadata, book text) |
//! | [`StorageError`] | annotation store operations |
//! | [`SpeechError`] | speech engine utterances |
//! | [`SelectionError`] | annotation commands given an unusable selection |

use std::fmt;

/// Which content resource failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    List,
    Metadata,
    Book,
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadKind::List => f.write_str("translation list"),
            LoadKind::Metadata => f.write_str("metadata"),
            LoadKind::Book => f.write_str("book"),
        }
    }
}

/// Network, I/O, or parse failure while fetching reference content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load {kind} '{key}': {message}")]
pub struct LoadError {
    pub kind: LoadKind,
    /// Resource key, e.g. `KRV` or `KRV/GEN`.
    pub key: String,
    pub message: String,
}

impl LoadError {
    pub fn new(kind: LoadKind, key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            kind,
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn list(message: impl fmt::Display) -> Self {
        Self::new(LoadKind::List, "translations", message)
    }

    pub fn metadata(translation_id: &str, message: impl fmt::Display) -> Self {
        Self::new(LoadKind::Metadata, translation_id, message)
    }

    pub fn book(translation_id: &str, book_id: &str, message: impl fmt::Display) -> Self {
        Self::new(
            LoadKind::Book,
            format!("{}/{}", translation_id, book_id),
            message,
        )
    }
}

/// Annotation table operation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("annotation storage unavailable: {0}")]
    Unavailable(String),

    #[error("annotation query failed: {0}")]
    Query(String),

    #[error("{table} record {id} not found")]
    NotFound { table: &'static str, id: i64 },
}

/// Utterance playback failure reported by a speech engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),

    #[error("utterance for verse {verse} failed: {message}")]
    Utterance { verse: u32, message: String },
}

/// An annotation command was issued with a selection it cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("notes need exactly one selected verse, {0} selected")]
    NotSingleVerse(usize),
}
