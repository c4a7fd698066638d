//! Annotation storage abstraction for Lectio.
//!
//! The [`AnnotationStore`] trait models three keyed tables (bookmarks,
//! highlights, notes). Every record carries a store-assigned id and is
//! indexed by its [`VerseLocator`]. Backends: [`memory::InMemoryAnnotationStore`]
//! here, and the SQLite store in the application crate.
//!
//! The store does not enforce one-record-per-locator. That convention is
//! upheld by the query-then-write commands in [`crate::annotate`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::models::{Bookmark, ChapterKey, Highlight, HighlightColor, Note, VerseLocator};

pub type StoreResult<T> = Result<T, StorageError>;

/// Table names, used in errors.
pub const BOOKMARKS: &str = "bookmarks";
pub const HIGHLIGHTS: &str = "highlights";
pub const NOTES: &str = "notes";

/// Abstract annotation backend.
///
/// # Operations
///
/// | Table | Lookup | Write | Listing |
/// |-------|--------|-------|---------|
/// | bookmarks | [`find_bookmark`](AnnotationStore::find_bookmark) | insert / delete | per chapter, all (newest first) |
/// | highlights | [`find_highlight`](AnnotationStore::find_highlight) | insert / update color / delete | per chapter, all |
/// | notes | [`find_note`](AnnotationStore::find_note) | insert / update text / delete | per chapter, all (recently updated first) |
///
/// Deletes return whether a record was removed; deleting a missing id is
/// not an error. Updates of a missing id fail with
/// [`StorageError::NotFound`].
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    // ── bookmarks ──

    /// The first bookmark at `locator`, if any.
    async fn find_bookmark(&self, locator: &VerseLocator) -> StoreResult<Option<Bookmark>>;

    async fn insert_bookmark(
        &self,
        locator: &VerseLocator,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Bookmark>;

    async fn delete_bookmark(&self, id: i64) -> StoreResult<bool>;

    async fn chapter_bookmarks(&self, key: &ChapterKey) -> StoreResult<Vec<Bookmark>>;

    /// Every bookmark, newest first.
    async fn list_bookmarks(&self) -> StoreResult<Vec<Bookmark>>;

    // ── highlights ──

    async fn find_highlight(&self, locator: &VerseLocator) -> StoreResult<Option<Highlight>>;

    async fn insert_highlight(
        &self,
        locator: &VerseLocator,
        color: HighlightColor,
    ) -> StoreResult<Highlight>;

    async fn update_highlight_color(&self, id: i64, color: HighlightColor) -> StoreResult<()>;

    async fn delete_highlight(&self, id: i64) -> StoreResult<bool>;

    /// Remove every highlight at `locator`, returning how many were removed.
    async fn delete_highlights_at(&self, locator: &VerseLocator) -> StoreResult<u64>;

    async fn chapter_highlights(&self, key: &ChapterKey) -> StoreResult<Vec<Highlight>>;

    /// Every highlight, in insertion order.
    async fn list_highlights(&self) -> StoreResult<Vec<Highlight>>;

    // ── notes ──

    async fn find_note(&self, locator: &VerseLocator) -> StoreResult<Option<Note>>;

    async fn insert_note(
        &self,
        locator: &VerseLocator,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Note>;

    async fn update_note(&self, id: i64, text: &str, updated_at: DateTime<Utc>)
        -> StoreResult<()>;

    async fn delete_note(&self, id: i64) -> StoreResult<bool>;

    async fn chapter_notes(&self, key: &ChapterKey) -> StoreResult<Vec<Note>>;

    /// Every note, most recently updated first.
    async fn list_notes(&self) -> StoreResult<Vec<Note>>;
}
