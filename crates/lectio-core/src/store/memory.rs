//! In-memory [`AnnotationStore`] implementation for testing and embedding.
//!
//! Uses `Vec` tables behind `std::sync::RwLock` with a shared
//! autoincrement counter, so ids are unique across all three tables.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::models::{Bookmark, ChapterKey, Highlight, HighlightColor, Note, VerseLocator};

use super::{AnnotationStore, StoreResult, HIGHLIGHTS, NOTES};

/// In-memory annotation store.
pub struct InMemoryAnnotationStore {
    next_id: AtomicI64,
    bookmarks: RwLock<Vec<Bookmark>>,
    highlights: RwLock<Vec<Highlight>>,
    notes: RwLock<Vec<Note>>,
}

impl InMemoryAnnotationStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            bookmarks: RwLock::new(Vec::new()),
            highlights: RwLock::new(Vec::new()),
            notes: RwLock::new(Vec::new()),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryAnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Unavailable("in-memory table lock poisoned".to_string())
}

fn in_chapter(locator: &VerseLocator, key: &ChapterKey) -> bool {
    locator.translation_id == key.translation_id
        && locator.book_id == key.book_id
        && locator.chapter == key.chapter
}

#[async_trait]
impl AnnotationStore for InMemoryAnnotationStore {
    async fn find_bookmark(&self, locator: &VerseLocator) -> StoreResult<Option<Bookmark>> {
        let table = self.bookmarks.read().map_err(poisoned)?;
        Ok(table.iter().find(|b| &b.locator == locator).cloned())
    }

    async fn insert_bookmark(
        &self,
        locator: &VerseLocator,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Bookmark> {
        let bookmark = Bookmark {
            id: self.allocate_id(),
            locator: locator.clone(),
            created_at,
        };
        self.bookmarks
            .write()
            .map_err(poisoned)?
            .push(bookmark.clone());
        Ok(bookmark)
    }

    async fn delete_bookmark(&self, id: i64) -> StoreResult<bool> {
        let mut table = self.bookmarks.write().map_err(poisoned)?;
        let before = table.len();
        table.retain(|b| b.id != id);
        Ok(table.len() != before)
    }

    async fn chapter_bookmarks(&self, key: &ChapterKey) -> StoreResult<Vec<Bookmark>> {
        let table = self.bookmarks.read().map_err(poisoned)?;
        Ok(table
            .iter()
            .filter(|b| in_chapter(&b.locator, key))
            .cloned()
            .collect())
    }

    async fn list_bookmarks(&self) -> StoreResult<Vec<Bookmark>> {
        let mut all = self.bookmarks.read().map_err(poisoned)?.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn find_highlight(&self, locator: &VerseLocator) -> StoreResult<Option<Highlight>> {
        let table = self.highlights.read().map_err(poisoned)?;
        Ok(table.iter().find(|h| &h.locator == locator).cloned())
    }

    async fn insert_highlight(
        &self,
        locator: &VerseLocator,
        color: HighlightColor,
    ) -> StoreResult<Highlight> {
        let highlight = Highlight {
            id: self.allocate_id(),
            locator: locator.clone(),
            color,
        };
        self.highlights
            .write()
            .map_err(poisoned)?
            .push(highlight.clone());
        Ok(highlight)
    }

    async fn update_highlight_color(&self, id: i64, color: HighlightColor) -> StoreResult<()> {
        let mut table = self.highlights.write().map_err(poisoned)?;
        let highlight = table
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(StorageError::NotFound {
                table: HIGHLIGHTS,
                id,
            })?;
        highlight.color = color;
        Ok(())
    }

    async fn delete_highlight(&self, id: i64) -> StoreResult<bool> {
        let mut table = self.highlights.write().map_err(poisoned)?;
        let before = table.len();
        table.retain(|h| h.id != id);
        Ok(table.len() != before)
    }

    async fn delete_highlights_at(&self, locator: &VerseLocator) -> StoreResult<u64> {
        let mut table = self.highlights.write().map_err(poisoned)?;
        let before = table.len();
        table.retain(|h| &h.locator != locator);
        Ok((before - table.len()) as u64)
    }

    async fn chapter_highlights(&self, key: &ChapterKey) -> StoreResult<Vec<Highlight>> {
        let table = self.highlights.read().map_err(poisoned)?;
        Ok(table
            .iter()
            .filter(|h| in_chapter(&h.locator, key))
            .cloned()
            .collect())
    }

    async fn list_highlights(&self) -> StoreResult<Vec<Highlight>> {
        Ok(self.highlights.read().map_err(poisoned)?.clone())
    }

    async fn find_note(&self, locator: &VerseLocator) -> StoreResult<Option<Note>> {
        let table = self.notes.read().map_err(poisoned)?;
        Ok(table.iter().find(|n| &n.locator == locator).cloned())
    }

    async fn insert_note(
        &self,
        locator: &VerseLocator,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Note> {
        let note = Note {
            id: self.allocate_id(),
            locator: locator.clone(),
            text: text.to_string(),
            updated_at,
        };
        self.notes.write().map_err(poisoned)?.push(note.clone());
        Ok(note)
    }

    async fn update_note(
        &self,
        id: i64,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut table = self.notes.write().map_err(poisoned)?;
        let note = table
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StorageError::NotFound { table: NOTES, id })?;
        note.text = text.to_string();
        note.updated_at = updated_at;
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> StoreResult<bool> {
        let mut table = self.notes.write().map_err(poisoned)?;
        let before = table.len();
        table.retain(|n| n.id != id);
        Ok(table.len() != before)
    }

    async fn chapter_notes(&self, key: &ChapterKey) -> StoreResult<Vec<Note>> {
        let table = self.notes.read().map_err(poisoned)?;
        Ok(table
            .iter()
            .filter(|n| in_chapter(&n.locator, key))
            .cloned()
            .collect())
    }

    async fn list_notes(&self) -> StoreResult<Vec<Note>> {
        let mut all = self.notes.read().map_err(poisoned)?.clone();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }
}
