//! Annotation commands: bookmark toggles, highlight application, note saves.
//!
//! Each command is a query-then-write pair against an [`AnnotationStore`],
//! which is what keeps the one-record-per-locator convention. The pairs are
//! not isolated from each other; the store is assumed to have a single local
//! writer.
//!
//! Bulk commands walk the verses in the order given and stop at the first
//! storage failure. Writes already made for earlier verses stay in place.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{ChapterKey, HighlightColor, Note, VerseLocator};
use crate::store::{AnnotationStore, StoreResult};

/// Result of toggling one verse's bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum BookmarkToggle {
    Added { verse: u32, id: i64 },
    Removed { verse: u32, id: i64 },
}

/// What a note save did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteOutcome {
    Created,
    Updated,
    Deleted,
    /// Empty text over no existing note.
    Unchanged,
}

/// Delete the bookmark at `locator` if one exists, otherwise create one.
pub async fn toggle_bookmark(
    store: &dyn AnnotationStore,
    locator: &VerseLocator,
    now: DateTime<Utc>,
) -> StoreResult<BookmarkToggle> {
    match store.find_bookmark(locator).await? {
        Some(existing) => {
            store.delete_bookmark(existing.id).await?;
            Ok(BookmarkToggle::Removed {
                verse: locator.verse,
                id: existing.id,
            })
        }
        None => {
            let created = store.insert_bookmark(locator, now).await?;
            Ok(BookmarkToggle::Added {
                verse: locator.verse,
                id: created.id,
            })
        }
    }
}

/// Toggle the bookmark of every verse in `verses`, in order.
pub async fn toggle_bookmarks(
    store: &dyn AnnotationStore,
    chapter: &ChapterKey,
    verses: &[u32],
    now: DateTime<Utc>,
) -> StoreResult<Vec<BookmarkToggle>> {
    let mut toggles = Vec::with_capacity(verses.len());
    for &verse in verses {
        toggles.push(toggle_bookmark(store, &chapter.verse(verse), now).await?);
    }
    Ok(toggles)
}

/// Set `color` on every verse in `verses`, recoloring existing highlights in
/// place.
pub async fn apply_highlight(
    store: &dyn AnnotationStore,
    chapter: &ChapterKey,
    verses: &[u32],
    color: HighlightColor,
) -> StoreResult<()> {
    for &verse in verses {
        let locator = chapter.verse(verse);
        match store.find_highlight(&locator).await? {
            Some(existing) => store.update_highlight_color(existing.id, color).await?,
            None => {
                store.insert_highlight(&locator, color).await?;
            }
        }
    }
    Ok(())
}

/// Remove the highlight at `locator`. Returns whether anything was removed.
pub async fn remove_highlight(
    store: &dyn AnnotationStore,
    locator: &VerseLocator,
) -> StoreResult<bool> {
    Ok(store.delete_highlights_at(locator).await? > 0)
}

/// Save a note. Whitespace-only text is treated as "no note".
pub async fn save_note(
    store: &dyn AnnotationStore,
    locator: &VerseLocator,
    text: &str,
    now: DateTime<Utc>,
) -> StoreResult<NoteOutcome> {
    let empty = text.trim().is_empty();
    match store.find_note(locator).await? {
        Some(existing) if empty => {
            store.delete_note(existing.id).await?;
            Ok(NoteOutcome::Deleted)
        }
        Some(existing) => {
            store.update_note(existing.id, text, now).await?;
            Ok(NoteOutcome::Updated)
        }
        None if empty => Ok(NoteOutcome::Unchanged),
        None => {
            store.insert_note(locator, text, now).await?;
            Ok(NoteOutcome::Created)
        }
    }
}

/// Everything annotated in one chapter, keyed by verse number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChapterAnnotations {
    pub bookmarked: BTreeSet<u32>,
    pub highlights: BTreeMap<u32, HighlightColor>,
    pub notes: BTreeMap<u32, Note>,
}

impl ChapterAnnotations {
    pub async fn load(store: &dyn AnnotationStore, key: &ChapterKey) -> StoreResult<Self> {
        let bookmarked = store
            .chapter_bookmarks(key)
            .await?
            .into_iter()
            .map(|b| b.locator.verse)
            .collect();
        let highlights = store
            .chapter_highlights(key)
            .await?
            .into_iter()
            .map(|h| (h.locator.verse, h.color))
            .collect();
        let notes = store
            .chapter_notes(key)
            .await?
            .into_iter()
            .map(|n| (n.locator.verse, n))
            .collect();
        Ok(Self {
            bookmarked,
            highlights,
            notes,
        })
    }
}
