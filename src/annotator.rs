//! Selection-driven annotation commands for the reader's current chapter.
//!
//! [`Annotator`] pairs a [`Reader`] (which owns the selection and the
//! location) with an [`AnnotationStore`]. Commit commands take the
//! selection, write through [`lectio_core::annotate`], and leave the
//! selection cleared whether or not the write succeeded. An empty
//! selection makes every commit a no-op that leaves the selection alone.

use std::sync::Arc;

use chrono::Utc;

use lectio_core::annotate::{self, BookmarkToggle, ChapterAnnotations, NoteOutcome};
use lectio_core::error::SelectionError;
use lectio_core::models::{Bookmark, Highlight, HighlightColor, Note};
use lectio_core::store::{AnnotationStore, StoreResult};

use crate::error::ReaderError;
use crate::reader::Reader;

/// Kinds of saved item, for listing and delete-by-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SavedKind {
    #[value(alias = "bookmark")]
    Bookmarks,
    #[value(alias = "highlight")]
    Highlights,
    #[value(alias = "note")]
    Notes,
}

impl SavedKind {
    pub fn singular(&self) -> &'static str {
        match self {
            SavedKind::Bookmarks => "bookmark",
            SavedKind::Highlights => "highlight",
            SavedKind::Notes => "note",
        }
    }
}

/// Annotation controller over the reader's current chapter.
pub struct Annotator {
    reader: Arc<Reader>,
    store: Arc<dyn AnnotationStore>,
}

impl Annotator {
    pub fn new(reader: Arc<Reader>, store: Arc<dyn AnnotationStore>) -> Self {
        Self { reader, store }
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    pub fn store(&self) -> &dyn AnnotationStore {
        self.store.as_ref()
    }

    /// Toggle the bookmark of every selected verse, in selection order.
    ///
    /// Stops at the first storage failure; earlier toggles stay written.
    pub async fn commit_bookmarks(&self) -> Result<Vec<BookmarkToggle>, ReaderError> {
        if self.reader.selection().is_empty() {
            return Ok(Vec::new());
        }
        let (location, selection) = self.reader.take_selection();
        let toggles = annotate::toggle_bookmarks(
            self.store(),
            &location.chapter_key(),
            selection.verses(),
            Utc::now(),
        )
        .await?;
        tracing::info!(%location, count = toggles.len(), "bookmarks toggled");
        Ok(toggles)
    }

    /// Highlight every selected verse with `color`. Returns how many verses
    /// were written.
    pub async fn commit_highlight(&self, color: HighlightColor) -> Result<usize, ReaderError> {
        if self.reader.selection().is_empty() {
            return Ok(0);
        }
        let (location, selection) = self.reader.take_selection();
        annotate::apply_highlight(
            self.store(),
            &location.chapter_key(),
            selection.verses(),
            color,
        )
        .await?;
        tracing::info!(%location, %color, count = selection.len(), "highlight applied");
        Ok(selection.len())
    }

    /// Save `text` as the note of the single selected verse.
    ///
    /// More than one selected verse is a [`SelectionError`] and leaves the
    /// selection as it was.
    pub async fn save_note(&self, text: &str) -> Result<NoteOutcome, ReaderError> {
        let selection = self.reader.selection();
        if selection.is_empty() {
            return Ok(NoteOutcome::Unchanged);
        }
        let verse = selection
            .single()
            .ok_or(SelectionError::NotSingleVerse(selection.len()))?;

        let (location, _) = self.reader.take_selection();
        let locator = location.verse(verse);
        let outcome = annotate::save_note(self.store(), &locator, text, Utc::now()).await?;
        tracing::info!(%locator, ?outcome, "note saved");
        Ok(outcome)
    }

    /// Remove the highlight on `verse` of the current chapter.
    pub async fn remove_highlight(&self, verse: u32) -> Result<bool, ReaderError> {
        let locator = self.reader.location().verse(verse);
        Ok(annotate::remove_highlight(self.store(), &locator).await?)
    }

    /// Bookmarks, highlights, and notes of the current chapter.
    pub async fn chapter_annotations(&self) -> StoreResult<ChapterAnnotations> {
        let key = self.reader.location().chapter_key();
        ChapterAnnotations::load(self.store(), &key).await
    }

    /// All bookmarks, newest first.
    pub async fn saved_bookmarks(&self) -> StoreResult<Vec<Bookmark>> {
        self.store.list_bookmarks().await
    }

    pub async fn saved_highlights(&self) -> StoreResult<Vec<Highlight>> {
        self.store.list_highlights().await
    }

    /// All notes, most recently updated first.
    pub async fn saved_notes(&self) -> StoreResult<Vec<Note>> {
        self.store.list_notes().await
    }

    /// Delete a saved item. Returns `false` when no such id exists.
    pub async fn delete_saved(&self, kind: SavedKind, id: i64) -> StoreResult<bool> {
        let removed = match kind {
            SavedKind::Bookmarks => self.store.delete_bookmark(id).await?,
            SavedKind::Highlights => self.store.delete_highlight(id).await?,
            SavedKind::Notes => self.store.delete_note(id).await?,
        };
        tracing::debug!(?kind, id, removed, "delete saved item");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ContentLoader, FsSource};
    use lectio_core::models::Location;
    use lectio_core::selection::ToolMode;
    use async_trait::async_trait;
    use chrono::DateTime;
    use lectio_core::error::StorageError;
    use lectio_core::models::{ChapterKey, VerseLocator};
    use lectio_core::store::memory::InMemoryAnnotationStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store whose inserts start failing after `budget` succeed.
    struct FailingStore {
        inner: InMemoryAnnotationStore,
        budget: AtomicUsize,
    }

    impl FailingStore {
        fn after_inserts(budget: usize) -> Self {
            Self {
                inner: InMemoryAnnotationStore::new(),
                budget: AtomicUsize::new(budget),
            }
        }

        fn spend(&self) -> StoreResult<()> {
            self.budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .map(|_| ())
                .map_err(|_| StorageError::Unavailable("disk".to_string()))
        }
    }

    #[async_trait]
    impl AnnotationStore for FailingStore {
        async fn find_bookmark(&self, locator: &VerseLocator) -> StoreResult<Option<Bookmark>> {
            self.inner.find_bookmark(locator).await
        }

        async fn insert_bookmark(
            &self,
            locator: &VerseLocator,
            created_at: DateTime<Utc>,
        ) -> StoreResult<Bookmark> {
            self.spend()?;
            self.inner.insert_bookmark(locator, created_at).await
        }

        async fn delete_bookmark(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete_bookmark(id).await
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
            self.spend()?;
            self.inner.insert_highlight(locator, color).await
        }

        async fn update_highlight_color(&self, id: i64, color: HighlightColor) -> StoreResult<()> {
            self.inner.update_highlight_color(id, color).await
        }

        async fn delete_highlight(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete_highlight(id).await
        }

        async fn delete_highlights_at(&self, locator: &VerseLocator) -> StoreResult<u64> {
            self.inner.delete_highlights_at(locator).await
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
            self.spend()?;
            self.inner.insert_note(locator, text, updated_at).await
        }

        async fn update_note(
            &self,
            id: i64,
            text: &str,
            updated_at: DateTime<Utc>,
        ) -> StoreResult<()> {
            self.inner.update_note(id, text, updated_at).await
        }

        async fn delete_note(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete_note(id).await
        }

        async fn chapter_notes(&self, key: &ChapterKey) -> StoreResult<Vec<Note>> {
            self.inner.chapter_notes(key).await
        }

        async fn list_notes(&self) -> StoreResult<Vec<Note>> {
            self.inner.list_notes().await
        }
    }

    async fn reader_at(book: &str, index: u32) -> Arc<Reader> {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bibles");
        let loader = Arc::new(ContentLoader::new(Arc::new(FsSource::new(root))));
        let reader = Arc::new(Reader::new(loader, Location::new("KRV", book, index)));
        reader.init().await.unwrap();
        reader
    }

    async fn annotator_at(book: &str, index: u32) -> Annotator {
        Annotator::new(
            reader_at(book, index).await,
            Arc::new(InMemoryAnnotationStore::new()),
        )
    }

    async fn failing_annotator(inserts: usize, verses: &[u32]) -> Annotator {
        let annotator = Annotator::new(
            reader_at("GEN", 0).await,
            Arc::new(FailingStore::after_inserts(inserts)),
        );
        for &verse in verses {
            annotator.reader().toggle_verse_selection(verse);
        }
        annotator
    }

    fn unavailable() -> ReaderError {
        ReaderError::Storage(StorageError::Unavailable("disk".to_string()))
    }

    #[tokio::test]
    async fn test_bookmark_commit_clears_selection() {
        let annotator = annotator_at("GEN", 0).await;
        annotator.reader().toggle_verse_selection(1);
        annotator.reader().toggle_verse_selection(3);

        let toggles = annotator.commit_bookmarks().await.unwrap();
        assert_eq!(toggles.len(), 2);
        assert!(annotator.reader().selection().is_empty());

        let view = annotator.chapter_annotations().await.unwrap();
        assert_eq!(view.bookmarked.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_empty_selection_is_no_op() {
        let annotator = annotator_at("GEN", 0).await;
        annotator.reader().set_tool_mode(ToolMode::Highlight);

        assert!(annotator.commit_bookmarks().await.unwrap().is_empty());
        assert_eq!(
            annotator.commit_highlight(HighlightColor::Blue).await.unwrap(),
            0
        );
        assert_eq!(
            annotator.save_note("hello").await.unwrap(),
            NoteOutcome::Unchanged
        );
        assert_eq!(
            annotator.reader().selection().tool_mode(),
            ToolMode::Highlight
        );
        assert!(annotator.saved_bookmarks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_highlight_twice_keeps_one_record() {
        let annotator = annotator_at("GEN", 0).await;
        annotator.reader().toggle_verse_selection(2);
        annotator.commit_highlight(HighlightColor::Yellow).await.unwrap();
        annotator.reader().toggle_verse_selection(2);
        annotator.commit_highlight(HighlightColor::Pink).await.unwrap();

        let all = annotator.saved_highlights().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].color, HighlightColor::Pink);

        assert!(annotator.remove_highlight(2).await.unwrap());
        assert!(!annotator.remove_highlight(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_note_requires_single_verse() {
        let annotator = annotator_at("GEN", 0).await;
        annotator.reader().toggle_verse_selection(1);
        annotator.reader().toggle_verse_selection(2);

        let err = annotator.save_note("two verses").await.unwrap_err();
        assert_eq!(
            err,
            ReaderError::Selection(SelectionError::NotSingleVerse(2))
        );
        assert_eq!(annotator.reader().selection().len(), 2);
        assert!(annotator.saved_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_note_create_then_delete_with_blank_text() {
        let annotator = annotator_at("GEN", 0).await;
        annotator.reader().toggle_verse_selection(1);
        assert_eq!(
            annotator.save_note("In the beginning").await.unwrap(),
            NoteOutcome::Created
        );
        let notes = annotator.saved_notes().await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].locator.verse, 1);

        annotator.reader().toggle_verse_selection(1);
        assert_eq!(
            annotator.save_note("  ").await.unwrap(),
            NoteOutcome::Deleted
        );
        assert!(annotator.saved_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_saved_by_id() {
        let annotator = annotator_at("GEN", 1).await;
        annotator.reader().toggle_verse_selection(3);
        let toggles = annotator.commit_bookmarks().await.unwrap();
        let BookmarkToggle::Added { id, .. } = toggles[0] else {
            panic!("expected an added bookmark");
        };

        assert!(annotator.delete_saved(SavedKind::Bookmarks, id).await.unwrap());
        assert!(!annotator.delete_saved(SavedKind::Bookmarks, id).await.unwrap());
        assert!(annotator.saved_bookmarks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bookmark_failure_keeps_earlier_writes() {
        let annotator = failing_annotator(1, &[1, 2, 3]).await;

        let err = annotator.commit_bookmarks().await.unwrap_err();
        assert_eq!(err, unavailable());
        assert!(annotator.reader().selection().is_empty());

        let saved = annotator.saved_bookmarks().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].locator.verse, 1);
    }

    #[tokio::test]
    async fn test_highlight_failure_keeps_earlier_writes() {
        let annotator = failing_annotator(1, &[2, 3]).await;

        let err = annotator
            .commit_highlight(HighlightColor::Green)
            .await
            .unwrap_err();
        assert_eq!(err, unavailable());
        assert!(annotator.reader().selection().is_empty());

        let saved = annotator.saved_highlights().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].locator.verse, 2);
    }

    #[tokio::test]
    async fn test_note_failure_clears_selection() {
        let annotator = failing_annotator(0, &[1]).await;

        let err = annotator.save_note("light").await.unwrap_err();
        assert_eq!(err, unavailable());
        assert!(annotator.reader().selection().is_empty());
        assert!(annotator.saved_notes().await.unwrap().is_empty());
    }
}
