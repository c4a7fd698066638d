//! Chapter-to-chapter transitions over a translation's book list.
//!
//! These functions compute *where* the next or previous chapter is. They do
//! no loading; the reader in the application crate turns the returned
//! [`Location`] into a navigation request.
//!
//! Transitions never wrap: stepping past the last chapter of the last book
//! (or before the first chapter of the first book) yields `None`.

use crate::models::{Location, TranslationMeta};

/// The chapter after `current`, crossing into the next book's first chapter
/// when `current` is the last chapter of its book.
///
/// Returns `None` at the last chapter of the last book, or when the current
/// book is not listed in `meta`.
pub fn next_chapter(meta: &TranslationMeta, current: &Location) -> Option<Location> {
    let position = meta.book_position(&current.book_id)?;
    let book = &meta.books[position];

    if current.chapter_index + 1 < book.chapters {
        return Some(Location::new(
            current.translation_id.clone(),
            current.book_id.clone(),
            current.chapter_index + 1,
        ));
    }

    meta.books
        .get(position + 1)
        .map(|next| Location::new(current.translation_id.clone(), next.id.clone(), 0))
}

/// The chapter before `current`, crossing into the previous book's *last*
/// chapter when `current` is chapter index 0.
///
/// Returns `None` at the first chapter of the first book, or when the
/// current book is not listed in `meta`.
pub fn prev_chapter(meta: &TranslationMeta, current: &Location) -> Option<Location> {
    let position = meta.book_position(&current.book_id)?;

    if current.chapter_index > 0 {
        return Some(Location::new(
            current.translation_id.clone(),
            current.book_id.clone(),
            current.chapter_index - 1,
        ));
    }

    let prev = meta.books.get(position.checked_sub(1)?)?;
    Some(Location::new(
        current.translation_id.clone(),
        prev.id.clone(),
        prev.chapters.saturating_sub(1),
    ))
}
