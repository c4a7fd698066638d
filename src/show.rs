//! Chapter display for `lectio show`, `goto`, `next`, and `prev`.
//!
//! Each verse line carries a bookmark marker (`*`) and its highlight color.
//! On a terminal the highlight is drawn as an ANSI background; otherwise
//! the color name is appended in brackets so piped output stays plain.
//! Notes follow their verse on an indented line.

use std::fmt::Write as _;

use anyhow::Result;

use lectio_core::annotate::ChapterAnnotations;
use lectio_core::models::HighlightColor;

use crate::config::Config;
use crate::reader::ReaderState;
use crate::session::Session;

fn ansi_background(color: HighlightColor) -> &'static str {
    match color {
        HighlightColor::Yellow => "\x1b[30;43m",
        HighlightColor::Green => "\x1b[30;42m",
        HighlightColor::Pink => "\x1b[30;45m",
        HighlightColor::Blue => "\x1b[30;44m",
    }
}

const ANSI_RESET: &str = "\x1b[0m";

/// Heading line: book name, chapter number, translation.
pub fn heading(state: &ReaderState) -> String {
    let book = state
        .book_name
        .clone()
        .unwrap_or_else(|| state.location.book_id.clone());
    format!(
        "{} {} ({})",
        book,
        state.location.chapter_number(),
        state.location.translation_id
    )
}

/// Render the current chapter with its annotations.
pub fn render_chapter(state: &ReaderState, annotations: &ChapterAnnotations, ansi: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(state));
    let _ = writeln!(out);

    let Some(chapter) = state.chapter.as_ref() else {
        let _ = writeln!(out, "  (no such chapter in this book)");
        return out;
    };

    for verse in &chapter.verses {
        let marker = if annotations.bookmarked.contains(&verse.verse) {
            '*'
        } else {
            ' '
        };
        let text = match annotations.highlights.get(&verse.verse) {
            Some(color) if ansi => format!("{}{}{}", ansi_background(*color), verse.text, ANSI_RESET),
            Some(color) => format!("{} [{}]", verse.text, color),
            None => verse.text.clone(),
        };
        let _ = writeln!(out, "{:>4}{} {}", verse.verse, marker, text);

        if let Some(note) = annotations.notes.get(&verse.verse) {
            let _ = writeln!(out, "       note: {}", note.text);
        }
    }
    out
}

/// Print the session's current chapter.
pub async fn print_current(session: &Session) -> Result<()> {
    let (annotator, pool) = session.annotator().await?;
    let annotations = annotator.chapter_annotations().await?;
    pool.close().await;

    let state = session.reader.snapshot().state;
    print!(
        "{}",
        render_chapter(&state, &annotations, atty::is(atty::Stream::Stdout))
    );
    Ok(())
}

pub async fn run_show(config: &Config) -> Result<()> {
    let session = Session::open(config).await?;
    print_current(&session).await
}
