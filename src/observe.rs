//! Change notifications for annotation data.
//!
//! [`ObservedStore`] wraps any [`AnnotationStore`] and publishes an
//! [`AnnotationChange`] on a broadcast channel after every successful
//! mutation. Readers subscribe once and re-query when a change touches the
//! data they display, instead of polling or keeping their own cache.
//!
//! [`ChapterSubscription`] narrows the stream to a single chapter, which is
//! the query shape every verse renderer uses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use lectio_core::models::{Bookmark, ChapterKey, Highlight, HighlightColor, Note, VerseLocator};
use lectio_core::store::{AnnotationStore, StoreResult};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Bookmark,
    Highlight,
    Note,
    /// Changes were missed; re-query everything.
    Any,
}

/// One committed mutation.
///
/// Deletes by id carry no locator: the row is already gone, so subscribers
/// treat them as touching every chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationChange {
    pub kind: ChangeKind,
    pub locator: Option<VerseLocator>,
}

impl AnnotationChange {
    fn at(kind: ChangeKind, locator: &VerseLocator) -> Self {
        Self {
            kind,
            locator: Some(locator.clone()),
        }
    }

    fn anywhere(kind: ChangeKind) -> Self {
        Self {
            kind,
            locator: None,
        }
    }

    /// Whether this change may affect what is shown for `key`.
    pub fn touches(&self, key: &ChapterKey) -> bool {
        match &self.locator {
            Some(locator) => &locator.chapter_key() == key,
            None => true,
        }
    }
}

/// An [`AnnotationStore`] that announces its writes.
pub struct ObservedStore {
    inner: Arc<dyn AnnotationStore>,
    changes: broadcast::Sender<AnnotationChange>,
}

impl ObservedStore {
    pub fn new(inner: Arc<dyn AnnotationStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { inner, changes }
    }

    /// Receive every change committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AnnotationChange> {
        self.changes.subscribe()
    }

    /// Receive only changes that touch `key`.
    pub fn subscribe_chapter(&self, key: ChapterKey) -> ChapterSubscription {
        ChapterSubscription {
            key,
            rx: self.changes.subscribe(),
        }
    }

    fn publish(&self, change: AnnotationChange) {
        // No receivers is fine: nothing is displaying annotations.
        let _ = self.changes.send(change);
    }
}

/// A change stream filtered to one chapter.
pub struct ChapterSubscription {
    key: ChapterKey,
    rx: broadcast::Receiver<AnnotationChange>,
}

impl ChapterSubscription {
    pub fn key(&self) -> &ChapterKey {
        &self.key
    }

    /// Wait for the next change touching this chapter.
    ///
    /// A lagged receiver reports a change with no locator so the caller
    /// re-queries. Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<AnnotationChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.touches(&self.key) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "annotation subscriber lagged");
                    return Some(AnnotationChange::anywhere(ChangeKind::Any));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// A pending change touching this chapter, without waiting.
    pub fn try_changed(&mut self) -> Option<AnnotationChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.touches(&self.key) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    return Some(AnnotationChange::anywhere(ChangeKind::Any))
                }
                Err(_) => return None,
            }
        }
    }
}

#[async_trait]
impl AnnotationStore for ObservedStore {
    async fn find_bookmark(&self, locator: &VerseLocator) -> StoreResult<Option<Bookmark>> {
        self.inner.find_bookmark(locator).await
    }

    async fn insert_bookmark(
        &self,
        locator: &VerseLocator,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Bookmark> {
        let bookmark = self.inner.insert_bookmark(locator, created_at).await?;
        self.publish(AnnotationChange::at(ChangeKind::Bookmark, locator));
        Ok(bookmark)
    }

    async fn delete_bookmark(&self, id: i64) -> StoreResult<bool> {
        let removed = self.inner.delete_bookmark(id).await?;
        if removed {
            self.publish(AnnotationChange::anywhere(ChangeKind::Bookmark));
        }
        Ok(removed)
    }

    async fn chapter_bookmarks(&self, key: &ChapterKey) -> StoreResult<Vec<Bookmark>> {
        self.inner.chapter_bookmarks(key).await
    }

    async fn list_bookmarks(&self) -> StoreResult<Vec<Bookmark>> {
        self.inner.list_bookmarks().await
    }

    async fn find_highlight(&self, locator: &VerseLocator) -> StoreResult<Option<Highlight>> {
        self.inner.find_highlight(locator).await
    }

    async fn insert_highlight(
        &self,
        locator: &VerseLocator,
        color: HighlightColor,
    ) -> StoreResult<Highlight> {
        let highlight = self.inner.insert_highlight(locator, color).await?;
        self.publish(AnnotationChange::at(ChangeKind::Highlight, locator));
        Ok(highlight)
    }

    async fn update_highlight_color(&self, id: i64, color: HighlightColor) -> StoreResult<()> {
        self.inner.update_highlight_color(id, color).await?;
        self.publish(AnnotationChange::anywhere(ChangeKind::Highlight));
        Ok(())
    }

    async fn delete_highlight(&self, id: i64) -> StoreResult<bool> {
        let removed = self.inner.delete_highlight(id).await?;
        if removed {
            self.publish(AnnotationChange::anywhere(ChangeKind::Highlight));
        }
        Ok(removed)
    }

    async fn delete_highlights_at(&self, locator: &VerseLocator) -> StoreResult<u64> {
        let removed = self.inner.delete_highlights_at(locator).await?;
        if removed > 0 {
            self.publish(AnnotationChange::at(ChangeKind::Highlight, locator));
        }
        Ok(removed)
    }

    async fn chapter_highlights(&self, key: &ChapterKey) -> StoreResult<Vec<Highlight>> {
        self.inner.chapter_highlights(key).await
    }

    async fn list_highlights(&self) -> StoreResult<Vec<Highlight>> {
        self.inner.list_highlights().await
    }

    async fn find_note(&self, locator: &VerseLocator) -> StoreResult<Option<Note>> {
        self.inner.find_note(locator).await
    }

    async fn insert_note(
        &self,
        locator: &VerseLocator,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Note> {
        let note = self.inner.insert_note(locator, text, updated_at).await?;
        self.publish(AnnotationChange::at(ChangeKind::Note, locator));
        Ok(note)
    }

    async fn update_note(
        &self,
        id: i64,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner.update_note(id, text, updated_at).await?;
        self.publish(AnnotationChange::anywhere(ChangeKind::Note));
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> StoreResult<bool> {
        let removed = self.inner.delete_note(id).await?;
        if removed {
            self.publish(AnnotationChange::anywhere(ChangeKind::Note));
        }
        Ok(removed)
    }

    async fn chapter_notes(&self, key: &ChapterKey) -> StoreResult<Vec<Note>> {
        self.inner.chapter_notes(key).await
    }

    async fn list_notes(&self) -> StoreResult<Vec<Note>> {
        self.inner.list_notes().await
    }
}
