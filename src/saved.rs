//! Saved-item listing and deletion for `lectio saved` and `lectio delete`.

use anyhow::{bail, Result};

use crate::annotator::SavedKind;
use crate::config::Config;
use crate::session::Session;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// List saved items of one kind, or all three kinds when `kind` is `None`.
pub async fn run_saved(config: &Config, kind: Option<SavedKind>) -> Result<()> {
    let session = Session::open_unloaded(config)?;
    let (annotator, pool) = session.annotator().await?;
    let wants = |k: SavedKind| kind.map_or(true, |only| only == k);

    if wants(SavedKind::Bookmarks) {
        let bookmarks = annotator.saved_bookmarks().await?;
        println!("Bookmarks ({})", bookmarks.len());
        for b in bookmarks {
            println!(
                "  {:>5}  {:<16} {}",
                b.id,
                b.locator.to_string(),
                b.created_at.format(TIME_FORMAT)
            );
        }
    }

    if wants(SavedKind::Highlights) {
        let highlights = annotator.saved_highlights().await?;
        println!("Highlights ({})", highlights.len());
        for h in highlights {
            println!("  {:>5}  {:<16} {}", h.id, h.locator.to_string(), h.color);
        }
    }

    if wants(SavedKind::Notes) {
        let notes = annotator.saved_notes().await?;
        println!("Notes ({})", notes.len());
        for n in notes {
            println!(
                "  {:>5}  {:<16} {}  {}",
                n.id,
                n.locator.to_string(),
                n.updated_at.format(TIME_FORMAT),
                n.text
            );
        }
    }

    pool.close().await;
    Ok(())
}

pub async fn run_delete(config: &Config, kind: SavedKind, id: i64) -> Result<()> {
    let session = Session::open_unloaded(config)?;
    let (annotator, pool) = session.annotator().await?;
    let removed = annotator.delete_saved(kind, id).await?;
    pool.close().await;

    if !removed {
        bail!("No saved {} with id {}", kind.singular(), id);
    }
    println!("Deleted {}", id);
    Ok(())
}
