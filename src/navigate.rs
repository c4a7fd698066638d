//! Navigation commands: `translations`, `books`, `goto`, `next`, `prev`.
//!
//! Every successful move is written back to the preference file so the
//! next invocation opens where this one left off. None of these commands
//! need the saved chapter itself, so a saved location that no longer
//! loads never blocks moving away from it.

use anyhow::{bail, Result};

use lectio_core::models::{Location, Testament};

use crate::config::Config;
use crate::reader::NavOutcome;
use crate::session::Session;
use crate::show;

pub async fn run_translations(config: &Config, all: bool) -> Result<()> {
    let session = Session::open_unloaded(config)?;
    let translations = session.reader.loader().list_translations().await?;
    let current = session.reader.location().translation_id;

    let listed = if all {
        translations.iter().collect()
    } else {
        session.prefs.visible_translations(&translations)
    };

    for t in listed {
        let marker = if t.id == current { '*' } else { ' ' };
        let favorite = if session.prefs.favorite_translations.contains(&t.id) {
            " (favorite)"
        } else {
            ""
        };
        println!("{} {:<6} {} [{}]{}", marker, t.id, t.name, t.language, favorite);
    }
    Ok(())
}

pub async fn run_books(config: &Config, testament: Option<Testament>) -> Result<()> {
    let session = Session::open_with_meta(config).await?;
    for book in session.reader.books(testament) {
        println!(
            "{:<4} {} ({}), {} chapters",
            book.id, book.name, book.name_en, book.chapters
        );
    }
    Ok(())
}

/// Jump to `book` chapter `chapter` (1-based), optionally in another
/// translation.
pub async fn run_goto(
    config: &Config,
    book: &str,
    chapter: u32,
    translation: Option<String>,
) -> Result<()> {
    let mut session = Session::open_unloaded(config)?;
    let translation_id = match translation {
        Some(id) => session.resolve_translation(&id).await?,
        None => session.reader.location().translation_id,
    };
    let book_id = book.to_ascii_uppercase();

    let meta = session.reader.loader().load_meta(&translation_id).await?;
    let Some(book_meta) = meta.book(&book_id) else {
        bail!("Unknown book '{}' in translation {}", book, translation_id);
    };
    if chapter == 0 || chapter > book_meta.chapters {
        bail!(
            "{} has chapters 1-{}, got {}",
            book_meta.name_en,
            book_meta.chapters,
            chapter
        );
    }

    session
        .reader
        .set_location(Location::new(translation_id, book_id, chapter - 1))
        .await?;
    session.persist_location()?;
    show::print_current(&session).await
}

pub async fn run_next(config: &Config) -> Result<()> {
    step(config, true).await
}

pub async fn run_prev(config: &Config) -> Result<()> {
    step(config, false).await
}

async fn step(config: &Config, forward: bool) -> Result<()> {
    let mut session = Session::open_with_meta(config).await?;
    if session.reader.snapshot().state.book_meta().is_none() {
        bail!(
            "{} is not a book of translation {}; use `lectio goto <book> <chapter>` to move",
            session.prefs.book_id,
            session.prefs.translation_id
        );
    }
    let outcome = if forward {
        session.reader.go_next_chapter().await?
    } else {
        session.reader.go_prev_chapter().await?
    };

    if outcome == NavOutcome::Unchanged {
        eprintln!(
            "Already at the {} chapter.",
            if forward { "last" } else { "first" }
        );
        return Ok(());
    }
    session.persist_location()?;
    show::print_current(&session).await
}
