//! The reader: current location, loaded content, and verse selection.
//!
//! [`Reader`] is the navigation state machine. It owns the current
//! (translation, book, chapter) triple, asks the [`ContentLoader`] for the
//! matching metadata and text, and commits location and content together
//! in one state update, so a half-applied navigation is never observable.
//!
//! # Ordering
//!
//! Navigations may overlap. Every [`Reader::set_location`] call takes a
//! request token from a monotonically increasing counter; when its loads
//! resolve, it commits only if no newer token has been issued since.
//! The last *requested* navigation wins, regardless of which fetch
//! finishes first. A discarded navigation reports
//! [`NavOutcome::Superseded`].
//!
//! # Loading flag
//!
//! `is_loading` counts navigations in flight. Each one holds a
//! [`LoadingGuard`] that releases on drop, so the flag clears on success,
//! failure, and early return alike.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use lectio_core::error::LoadError;
use lectio_core::models::{BookMeta, Chapter, Location, Testament, Translation, TranslationMeta};
use lectio_core::navigation;
use lectio_core::selection::{Selection, ToolMode};

use crate::loader::ContentLoader;

/// What a navigation request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavOutcome {
    /// The new location and its content are now current.
    Committed,
    /// A newer request was issued while this one was loading.
    Superseded,
    /// Nothing to do (e.g. next chapter at the very end).
    Unchanged,
}

/// Everything the reader currently holds.
#[derive(Debug, Clone, Serialize)]
pub struct ReaderState {
    pub location: Location,
    pub translations: Arc<Vec<Translation>>,
    pub meta: Option<Arc<TranslationMeta>>,
    /// Display name of the current book, from the loaded book data.
    pub book_name: Option<String>,
    /// `None` before the first load, or when the chapter index is past the
    /// end of the book.
    pub chapter: Option<Chapter>,
    pub selection: Selection,
}

/// A copy of [`ReaderState`] plus the loading flag.
#[derive(Debug, Clone, Serialize)]
pub struct ReaderSnapshot {
    #[serde(flatten)]
    pub state: ReaderState,
    pub is_loading: bool,
}

impl ReaderState {
    pub fn book_meta(&self) -> Option<&BookMeta> {
        self.meta.as_ref()?.book(&self.location.book_id)
    }

    pub fn translation(&self) -> Option<&Translation> {
        self.translations
            .iter()
            .find(|t| t.id == self.location.translation_id)
    }
}

/// Holds the in-flight count up while a navigation runs.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn acquire(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Navigation state machine over a [`ContentLoader`].
pub struct Reader {
    loader: Arc<ContentLoader>,
    state: Mutex<ReaderState>,
    latest_request: AtomicU64,
    in_flight: AtomicUsize,
}

impl Reader {
    /// A reader positioned at `start`, with nothing loaded yet.
    pub fn new(loader: Arc<ContentLoader>, start: Location) -> Self {
        Self {
            loader,
            state: Mutex::new(ReaderState {
                location: start,
                translations: Arc::new(Vec::new()),
                meta: None,
                book_name: None,
                chapter: None,
                selection: Selection::new(),
            }),
            latest_request: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue_token(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == token
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn location(&self) -> Location {
        self.state().location.clone()
    }

    pub fn current_chapter(&self) -> Option<Chapter> {
        self.state().chapter.clone()
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        ReaderSnapshot {
            state: self.state().clone(),
            is_loading: self.is_loading(),
        }
    }

    /// Language tag of the current translation, if the list is loaded.
    pub fn language(&self) -> Option<String> {
        self.state().translation().map(|t| t.language.clone())
    }

    /// First load: translation list, metadata, and the current book, all
    /// fetched concurrently.
    pub async fn init(&self) -> Result<NavOutcome, LoadError> {
        let _loading = LoadingGuard::acquire(&self.in_flight);
        let token = self.issue_token();
        let location = self.location();

        let (translations, meta, book) = tokio::join!(
            self.loader.list_translations(),
            self.loader.load_meta(&location.translation_id),
            self.loader.load_book(&location.translation_id, &location.book_id),
        );
        let loaded = translations.and_then(|t| Ok((t, meta?, book?)));
        let (translations, meta, book) = match loaded {
            Ok(loaded) => loaded,
            Err(_) if !self.is_current(token) => return Ok(NavOutcome::Superseded),
            Err(e) => return Err(e),
        };

        let mut state = self.state();
        state.translations = translations;
        if !self.is_current(token) {
            tracing::warn!(%location, "initial load superseded by a newer navigation");
            return Ok(NavOutcome::Superseded);
        }
        state.meta = Some(meta);
        state.book_name = Some(book.book_name.clone());
        state.chapter = book.chapter_at(location.chapter_index).cloned();
        tracing::info!(%location, has_chapter = state.chapter.is_some(), "reader initialized");
        Ok(NavOutcome::Committed)
    }

    /// Load only the current translation's list and metadata, leaving the
    /// chapter unloaded. Lets chapter stepping and book listing work when
    /// the saved book itself cannot be loaded.
    pub async fn load_meta(&self) -> Result<NavOutcome, LoadError> {
        let _loading = LoadingGuard::acquire(&self.in_flight);
        let token = self.issue_token();
        let location = self.location();

        let (translations, meta) = tokio::join!(
            self.loader.list_translations(),
            self.loader.load_meta(&location.translation_id),
        );
        let (translations, meta) = match translations.and_then(|t| Ok((t, meta?))) {
            Ok(loaded) => loaded,
            Err(_) if !self.is_current(token) => return Ok(NavOutcome::Superseded),
            Err(e) => return Err(e),
        };

        let mut state = self.state();
        state.translations = translations;
        if !self.is_current(token) {
            return Ok(NavOutcome::Superseded);
        }
        state.meta = Some(meta);
        Ok(NavOutcome::Committed)
    }

    /// Navigate to `location`.
    ///
    /// Clears the verse selection immediately. On failure the previous
    /// location and content stay current and the error is returned.
    pub async fn set_location(&self, location: Location) -> Result<NavOutcome, LoadError> {
        let _loading = LoadingGuard::acquire(&self.in_flight);
        let token = self.issue_token();
        self.state().selection.clear();

        let (meta, book) = tokio::join!(
            self.loader.load_meta(&location.translation_id),
            self.loader.load_book(&location.translation_id, &location.book_id),
        );
        let (meta, book) = match (meta, book) {
            (Ok(meta), Ok(book)) => (meta, book),
            (Err(e), _) | (_, Err(e)) => {
                if !self.is_current(token) {
                    tracing::debug!(%location, error = %e, "superseded navigation failed");
                    return Ok(NavOutcome::Superseded);
                }
                tracing::warn!(%location, error = %e, "navigation failed");
                return Err(e);
            }
        };

        let mut state = self.state();
        if !self.is_current(token) {
            tracing::warn!(%location, token, "discarding superseded navigation");
            return Ok(NavOutcome::Superseded);
        }
        state.chapter = book.chapter_at(location.chapter_index).cloned();
        state.book_name = Some(book.book_name.clone());
        state.meta = Some(meta);
        state.location = location;
        tracing::info!(location = %state.location, "navigated");
        Ok(NavOutcome::Committed)
    }

    /// Move one chapter forward, into the next book if needed.
    pub async fn go_next_chapter(&self) -> Result<NavOutcome, LoadError> {
        let target = {
            let state = self.state();
            state
                .meta
                .as_deref()
                .and_then(|meta| navigation::next_chapter(meta, &state.location))
        };
        match target {
            Some(location) => self.set_location(location).await,
            None => Ok(NavOutcome::Unchanged),
        }
    }

    /// Move one chapter back, into the previous book's last chapter if
    /// needed.
    pub async fn go_prev_chapter(&self) -> Result<NavOutcome, LoadError> {
        let target = {
            let state = self.state();
            state
                .meta
                .as_deref()
                .and_then(|meta| navigation::prev_chapter(meta, &state.location))
        };
        match target {
            Some(location) => self.set_location(location).await,
            None => Ok(NavOutcome::Unchanged),
        }
    }

    /// Show the same book and chapter in another translation.
    pub async fn switch_translation(&self, translation_id: &str) -> Result<NavOutcome, LoadError> {
        let current = self.location();
        if current.translation_id == translation_id {
            return Ok(NavOutcome::Unchanged);
        }
        self.set_location(Location::new(
            translation_id,
            current.book_id,
            current.chapter_index,
        ))
        .await
    }

    /// Books of the current translation, optionally limited to one
    /// testament.
    pub fn books(&self, testament: Option<Testament>) -> Vec<BookMeta> {
        let state = self.state();
        let Some(meta) = state.meta.as_ref() else {
            return Vec::new();
        };
        match testament {
            Some(t) => meta.books_in(t).cloned().collect(),
            None => meta.books.clone(),
        }
    }

    // ── selection ──

    pub fn selection(&self) -> Selection {
        self.state().selection.clone()
    }

    pub fn toggle_verse_selection(&self, verse: u32) {
        self.state().selection.toggle(verse);
    }

    pub fn clear_selection(&self) {
        self.state().selection.clear();
    }

    pub fn set_tool_mode(&self, mode: ToolMode) {
        self.state().selection.set_tool_mode(mode);
    }

    /// Take the current selection for a commit, leaving it cleared.
    pub(crate) fn take_selection(&self) -> (Location, Selection) {
        let mut state = self.state();
        let selection = std::mem::take(&mut state.selection);
        (state.location.clone(), selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ContentSource;
    use async_trait::async_trait;
    use lectio_core::models::{BookData, Verse};
    use tokio::sync::Notify;

    fn book_meta(id: &str, testament: Testament, chapters: u32) -> BookMeta {
        BookMeta {
            id: id.to_string(),
            name: id.to_string(),
            name_en: id.to_string(),
            testament,
            chapters,
        }
    }

    /// GEN (2 chapters), EXO (1 chapter), MAT (1 chapter) in every
    /// translation. Book loads for `gated` wait until the gate opens.
    struct FixtureSource {
        gated: Option<String>,
        gate: Notify,
        missing_book: Option<String>,
    }

    impl FixtureSource {
        fn new() -> Self {
            Self {
                gated: None,
                gate: Notify::new(),
                missing_book: None,
            }
        }
    }

    #[async_trait]
    impl ContentSource for FixtureSource {
        fn describe(&self) -> String {
            "fixture".to_string()
        }

        async fn translations(&self) -> Result<Vec<Translation>, LoadError> {
            Ok(vec![
                Translation {
                    id: "KRV".to_string(),
                    name: "Korean Revised".to_string(),
                    language: "ko".to_string(),
                    direction: Default::default(),
                },
                Translation {
                    id: "WEB".to_string(),
                    name: "World English Bible".to_string(),
                    language: "en".to_string(),
                    direction: Default::default(),
                },
            ])
        }

        async fn metadata(&self, translation_id: &str) -> Result<TranslationMeta, LoadError> {
            Ok(TranslationMeta {
                translation_id: translation_id.to_string(),
                books: vec![
                    book_meta("GEN", Testament::Old, 2),
                    book_meta("EXO", Testament::Old, 1),
                    book_meta("MAT", Testament::New, 1),
                ],
            })
        }

        async fn book(&self, translation_id: &str, book_id: &str) -> Result<BookData, LoadError> {
            if self.gated.as_deref() == Some(book_id) {
                self.gate.notified().await;
            }
            if self.missing_book.as_deref() == Some(book_id) {
                return Err(LoadError::book(translation_id, book_id, "HTTP 404"));
            }
            let chapters = match book_id {
                "GEN" => 2,
                _ => 1,
            };
            Ok(BookData {
                book_id: book_id.to_string(),
                book_name: format!("{} {}", translation_id, book_id),
                chapters: (1..=chapters)
                    .map(|c| Chapter {
                        chapter: c,
                        verses: vec![Verse {
                            verse: 1,
                            text: format!("{} {} {}:1", translation_id, book_id, c),
                        }],
                    })
                    .collect(),
            })
        }
    }

    fn reader_over(source: FixtureSource, start: Location) -> Reader {
        let loader = Arc::new(ContentLoader::new(Arc::new(source)));
        Reader::new(loader, start)
    }

    fn at(book: &str, index: u32) -> Location {
        Location::new("KRV", book, index)
    }

    #[tokio::test]
    async fn test_init_loads_location() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 1));
        assert_eq!(reader.init().await.unwrap(), NavOutcome::Committed);

        let snap = reader.snapshot();
        assert!(!snap.is_loading);
        assert_eq!(snap.state.translations.len(), 2);
        assert_eq!(snap.state.chapter.unwrap().chapter, 2);
        assert_eq!(snap.state.book_name.as_deref(), Some("KRV GEN"));
        assert_eq!(reader.language().as_deref(), Some("ko"));
    }

    #[tokio::test]
    async fn test_next_crosses_book_boundary() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 1));
        reader.init().await.unwrap();

        assert_eq!(reader.go_next_chapter().await.unwrap(), NavOutcome::Committed);
        assert_eq!(reader.location(), at("EXO", 0));
        assert_eq!(reader.current_chapter().unwrap().verses[0].text, "KRV EXO 1:1");
    }

    #[tokio::test]
    async fn test_prev_lands_on_last_chapter_of_previous_book() {
        let reader = reader_over(FixtureSource::new(), at("EXO", 0));
        reader.init().await.unwrap();

        reader.go_prev_chapter().await.unwrap();
        assert_eq!(reader.location(), at("GEN", 1));
    }

    #[tokio::test]
    async fn test_ends_are_no_ops() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 0));
        reader.init().await.unwrap();
        assert_eq!(reader.go_prev_chapter().await.unwrap(), NavOutcome::Unchanged);
        assert_eq!(reader.location(), at("GEN", 0));

        reader.set_location(at("MAT", 0)).await.unwrap();
        assert_eq!(reader.go_next_chapter().await.unwrap(), NavOutcome::Unchanged);
        assert_eq!(reader.location(), at("MAT", 0));
    }

    #[tokio::test]
    async fn test_next_before_metadata_is_no_op() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 0));
        assert_eq!(reader.go_next_chapter().await.unwrap(), NavOutcome::Unchanged);
        assert_eq!(reader.location(), at("GEN", 0));
    }

    #[tokio::test]
    async fn test_chapter_index_past_end_has_no_chapter() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 0));
        reader.init().await.unwrap();
        reader.set_location(at("GEN", 7)).await.unwrap();

        let snap = reader.snapshot();
        assert_eq!(snap.state.location, at("GEN", 7));
        assert!(snap.state.chapter.is_none());
    }

    #[tokio::test]
    async fn test_navigation_clears_selection() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 0));
        reader.init().await.unwrap();
        reader.toggle_verse_selection(1);
        reader.set_tool_mode(ToolMode::Highlight);

        reader.go_next_chapter().await.unwrap();
        let selection = reader.selection();
        assert!(selection.is_empty());
        assert_eq!(selection.tool_mode(), ToolMode::None);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let mut source = FixtureSource::new();
        source.missing_book = Some("EXO".to_string());
        let reader = reader_over(source, at("GEN", 1));
        reader.init().await.unwrap();

        let err = reader.go_next_chapter().await.unwrap_err();
        assert_eq!(err.key, "KRV/EXO");
        assert_eq!(reader.location(), at("GEN", 1));
        assert_eq!(reader.current_chapter().unwrap().chapter, 2);
        assert!(!reader.is_loading());
    }

    #[tokio::test]
    async fn test_last_requested_navigation_wins() {
        let mut source = FixtureSource::new();
        source.gated = Some("EXO".to_string());
        let source = Arc::new(source);
        let loader = Arc::new(ContentLoader::new(source.clone()));
        let reader = Reader::new(loader, at("GEN", 0));

        // The EXO request is issued first but resolves last.
        let slow = reader.set_location(at("EXO", 0));
        let fast = async {
            let outcome = reader.set_location(at("MAT", 0)).await;
            assert!(reader.is_loading());
            source.gate.notify_one();
            outcome
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(fast.unwrap(), NavOutcome::Committed);
        assert_eq!(slow.unwrap(), NavOutcome::Superseded);
        assert_eq!(reader.location(), at("MAT", 0));
        assert_eq!(reader.current_chapter().unwrap().verses[0].text, "KRV MAT 1:1");
        assert!(!reader.is_loading());
    }

    #[tokio::test]
    async fn test_superseded_failure_is_not_an_error() {
        let mut source = FixtureSource::new();
        source.gated = Some("EXO".to_string());
        source.missing_book = Some("EXO".to_string());
        let source = Arc::new(source);
        let loader = Arc::new(ContentLoader::new(source.clone()));
        let reader = Reader::new(loader, at("GEN", 0));

        let slow = reader.set_location(at("EXO", 0));
        let fast = async {
            let outcome = reader.set_location(at("MAT", 0)).await;
            source.gate.notify_one();
            outcome
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(fast.unwrap(), NavOutcome::Committed);
        assert_eq!(slow.unwrap(), NavOutcome::Superseded);
        assert_eq!(reader.location(), at("MAT", 0));
        assert!(!reader.is_loading());
    }

    #[tokio::test]
    async fn test_load_meta_allows_stepping_off_unloadable_book() {
        let mut source = FixtureSource::new();
        source.missing_book = Some("GEN".to_string());
        let reader = reader_over(source, at("GEN", 1));

        assert!(reader.init().await.is_err());
        assert!(reader.snapshot().state.meta.is_none());

        assert_eq!(reader.load_meta().await.unwrap(), NavOutcome::Committed);
        assert!(reader.current_chapter().is_none());
        assert_eq!(reader.books(None).len(), 3);

        assert_eq!(reader.go_next_chapter().await.unwrap(), NavOutcome::Committed);
        assert_eq!(reader.location(), at("EXO", 0));
    }

    #[tokio::test]
    async fn test_switch_translation_keeps_book_and_chapter() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 1));
        reader.init().await.unwrap();

        assert_eq!(
            reader.switch_translation("KRV").await.unwrap(),
            NavOutcome::Unchanged
        );
        reader.switch_translation("WEB").await.unwrap();
        assert_eq!(reader.location(), Location::new("WEB", "GEN", 1));
        assert_eq!(reader.language().as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_books_filter_by_testament() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 0));
        assert!(reader.books(None).is_empty());
        reader.init().await.unwrap();

        assert_eq!(reader.books(None).len(), 3);
        let new: Vec<_> = reader
            .books(Some(Testament::New))
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(new, vec!["MAT"]);
    }

    #[tokio::test]
    async fn test_take_selection_leaves_it_empty() {
        let reader = reader_over(FixtureSource::new(), at("GEN", 0));
        reader.toggle_verse_selection(3);
        reader.toggle_verse_selection(1);

        let (location, selection) = reader.take_selection();
        assert_eq!(location, at("GEN", 0));
        assert_eq!(selection.verses(), &[3, 1]);
        assert!(reader.selection().is_empty());
    }
}
