//! Annotation commands: `bookmark`, `highlight`, `unhighlight`, `note`.
//!
//! Verse numbers given on the command line become the selection, in the
//! order given, and the matching [`Annotator`] commit runs over it.
//! Verses that do not exist in the current chapter are rejected before
//! anything is written.

use anyhow::{bail, Result};

use lectio_core::annotate::{BookmarkToggle, NoteOutcome};
use lectio_core::models::HighlightColor;
use lectio_core::selection::ToolMode;

use crate::annotator::Annotator;
use crate::config::Config;
use crate::session::Session;

fn select(annotator: &Annotator, verses: &[u32]) -> Result<()> {
    let reader = annotator.reader();
    let Some(chapter) = reader.current_chapter() else {
        bail!("No chapter loaded at {}", reader.location());
    };
    for &verse in verses {
        if !chapter.verses.iter().any(|v| v.verse == verse) {
            bail!("Verse {} is not in {}", verse, reader.location());
        }
        if !reader.selection().contains(verse) {
            reader.toggle_verse_selection(verse);
        }
    }
    Ok(())
}

pub async fn run_bookmark(config: &Config, verses: &[u32]) -> Result<()> {
    let session = Session::open(config).await?;
    let (annotator, pool) = session.annotator().await?;
    select(&annotator, verses)?;

    let location = session.reader.location();
    for toggle in annotator.commit_bookmarks().await? {
        match toggle {
            BookmarkToggle::Added { verse, .. } => {
                println!("Bookmarked {}", location.verse(verse))
            }
            BookmarkToggle::Removed { verse, .. } => {
                println!("Removed bookmark {}", location.verse(verse))
            }
        }
    }
    pool.close().await;
    Ok(())
}

pub async fn run_highlight(config: &Config, color: HighlightColor, verses: &[u32]) -> Result<()> {
    let session = Session::open(config).await?;
    let (annotator, pool) = session.annotator().await?;
    session.reader.set_tool_mode(ToolMode::Highlight);
    select(&annotator, verses)?;

    let count = annotator.commit_highlight(color).await?;
    println!(
        "Highlighted {} verse(s) {} in {}",
        count,
        color,
        session.reader.location()
    );
    pool.close().await;
    Ok(())
}

pub async fn run_unhighlight(config: &Config, verse: u32) -> Result<()> {
    let session = Session::open(config).await?;
    let (annotator, pool) = session.annotator().await?;

    let locator = session.reader.location().verse(verse);
    if annotator.remove_highlight(verse).await? {
        println!("Removed highlight {}", locator);
    } else {
        println!("No highlight at {}", locator);
    }
    pool.close().await;
    Ok(())
}

pub async fn run_note(config: &Config, verse: u32, text: &str) -> Result<()> {
    let session = Session::open(config).await?;
    let (annotator, pool) = session.annotator().await?;
    session.reader.set_tool_mode(ToolMode::Note);
    select(&annotator, &[verse])?;

    let locator = session.reader.location().verse(verse);
    match annotator.save_note(text).await? {
        NoteOutcome::Created => println!("Added note {}", locator),
        NoteOutcome::Updated => println!("Updated note {}", locator),
        NoteOutcome::Deleted => println!("Deleted note {}", locator),
        NoteOutcome::Unchanged => println!("No note at {}", locator),
    }
    pool.close().await;
    Ok(())
}
