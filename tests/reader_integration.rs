//! Reader and annotator behavior over real stores and content sources.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use lectio::annotator::Annotator;
use lectio::db;
use lectio::loader::{ContentLoader, ContentSource, FsSource};
use lectio::migrate;
use lectio::observe::{ChangeKind, ObservedStore};
use lectio::reader::{NavOutcome, Reader};
use lectio::sqlite_store::SqliteAnnotationStore;
use lectio_core::annotate::NoteOutcome;
use lectio_core::error::LoadError;
use lectio_core::models::{
    BookData, BookMeta, Chapter, HighlightColor, Location, Testament, Translation,
    TranslationMeta, Verse,
};
use lectio_core::store::AnnotationStore;

/// Genesis with its full 50 chapters followed by Exodus, one verse each.
struct CanonSource;

#[async_trait]
impl ContentSource for CanonSource {
    fn describe(&self) -> String {
        "canon".to_string()
    }

    async fn translations(&self) -> Result<Vec<Translation>, LoadError> {
        Ok(vec![Translation {
            id: "KRV".to_string(),
            name: "개역한글".to_string(),
            language: "ko".to_string(),
            direction: Default::default(),
        }])
    }

    async fn metadata(&self, translation_id: &str) -> Result<TranslationMeta, LoadError> {
        let book = |id: &str, chapters| BookMeta {
            id: id.to_string(),
            name: id.to_string(),
            name_en: id.to_string(),
            testament: Testament::Old,
            chapters,
        };
        Ok(TranslationMeta {
            translation_id: translation_id.to_string(),
            books: vec![book("GEN", 50), book("EXO", 40)],
        })
    }

    async fn book(&self, _translation_id: &str, book_id: &str) -> Result<BookData, LoadError> {
        let chapters = if book_id == "GEN" { 50 } else { 40 };
        Ok(BookData {
            book_id: book_id.to_string(),
            book_name: book_id.to_string(),
            chapters: (1..=chapters)
                .map(|chapter| Chapter {
                    chapter,
                    verses: vec![Verse {
                        verse: 1,
                        text: format!("{} {}:1", book_id, chapter),
                    }],
                })
                .collect(),
        })
    }
}

fn canon_reader(start: Location) -> Reader {
    Reader::new(Arc::new(ContentLoader::new(Arc::new(CanonSource))), start)
}

fn fixture_reader(start: Location) -> Reader {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bibles");
    Reader::new(
        Arc::new(ContentLoader::new(Arc::new(FsSource::new(root)))),
        start,
    )
}

async fn sqlite_store(tmp: &TempDir) -> SqliteAnnotationStore {
    let pool = db::connect_path(&tmp.path().join("lectio.sqlite"))
        .await
        .unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    SqliteAnnotationStore::new(pool)
}

#[tokio::test]
async fn test_genesis_one_prev_is_no_op() {
    let reader = canon_reader(Location::new("KRV", "GEN", 0));
    reader.init().await.unwrap();

    assert_eq!(reader.go_prev_chapter().await.unwrap(), NavOutcome::Unchanged);
    assert_eq!(reader.location(), Location::new("KRV", "GEN", 0));
}

#[tokio::test]
async fn test_genesis_fifty_next_is_exodus_one() {
    let reader = canon_reader(Location::new("KRV", "GEN", 49));
    reader.init().await.unwrap();
    assert_eq!(reader.current_chapter().unwrap().chapter, 50);

    reader.go_next_chapter().await.unwrap();
    assert_eq!(reader.location(), Location::new("KRV", "EXO", 0));
    assert_eq!(reader.current_chapter().unwrap().verses[0].text, "EXO 1:1");
}

#[tokio::test]
async fn test_two_moves_equal_one_direct_move() {
    let stepped = fixture_reader(Location::new("KRV", "GEN", 0));
    stepped.init().await.unwrap();
    stepped
        .set_location(Location::new("KRV", "EXO", 0))
        .await
        .unwrap();
    stepped
        .set_location(Location::new("WEB", "MAT", 0))
        .await
        .unwrap();

    let direct = fixture_reader(Location::new("KRV", "GEN", 0));
    direct.init().await.unwrap();
    direct
        .set_location(Location::new("WEB", "MAT", 0))
        .await
        .unwrap();

    let a = stepped.snapshot().state;
    let b = direct.snapshot().state;
    assert_eq!(a.location, b.location);
    assert_eq!(a.chapter, b.chapter);
    assert_eq!(a.book_name, b.book_name);
    assert_eq!(a.meta, b.meta);
}

#[tokio::test]
async fn test_missing_translation_keeps_state() {
    let reader = fixture_reader(Location::new("KRV", "GEN", 0));
    reader.init().await.unwrap();

    let err = reader.switch_translation("NIV").await.unwrap_err();
    assert_eq!(err.key, "NIV");
    assert_eq!(reader.location(), Location::new("KRV", "GEN", 0));
    assert!(!reader.is_loading());
}

#[tokio::test]
async fn test_annotations_persist_in_sqlite() {
    let tmp = TempDir::new().unwrap();
    let reader = Arc::new(fixture_reader(Location::new("WEB", "GEN", 0)));
    reader.init().await.unwrap();
    let annotator = Annotator::new(reader.clone(), Arc::new(sqlite_store(&tmp).await));

    reader.toggle_verse_selection(2);
    reader.toggle_verse_selection(1);
    annotator.commit_bookmarks().await.unwrap();

    reader.toggle_verse_selection(3);
    annotator
        .commit_highlight(HighlightColor::Green)
        .await
        .unwrap();

    reader.toggle_verse_selection(1);
    assert_eq!(
        annotator.save_note("light").await.unwrap(),
        NoteOutcome::Created
    );

    let view = annotator.chapter_annotations().await.unwrap();
    assert_eq!(view.bookmarked.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(view.highlights.get(&3), Some(&HighlightColor::Green));
    assert_eq!(view.notes.get(&1).unwrap().text, "light");

    // Same verses in another chapter are separate records.
    reader
        .set_location(Location::new("WEB", "GEN", 1))
        .await
        .unwrap();
    let view = annotator.chapter_annotations().await.unwrap();
    assert!(view.bookmarked.is_empty());
    assert!(view.highlights.is_empty());
    assert!(view.notes.is_empty());

    // Reopening the database sees the same data.
    let reopened = sqlite_store(&tmp).await;
    assert_eq!(reopened.list_bookmarks().await.unwrap().len(), 2);
    assert_eq!(reopened.list_notes().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_observed_store_notifies_current_chapter() {
    let tmp = TempDir::new().unwrap();
    let reader = Arc::new(fixture_reader(Location::new("WEB", "GEN", 0)));
    reader.init().await.unwrap();

    let store = Arc::new(ObservedStore::new(Arc::new(sqlite_store(&tmp).await)));
    let mut subscription = store.subscribe_chapter(reader.location().chapter_key());
    let annotator = Annotator::new(reader.clone(), store.clone());

    reader.toggle_verse_selection(2);
    annotator.commit_bookmarks().await.unwrap();

    let change = subscription.changed().await.unwrap();
    assert_eq!(change.kind, ChangeKind::Bookmark);
    assert_eq!(change.locator.unwrap().verse, 2);
}
