//! `lectio read`: read the current chapter aloud in the terminal.

use anyhow::{bail, Result};

use lectio_core::read_aloud::ReadAloud;

use crate::config::Config;
use crate::session::Session;
use crate::show;
use crate::speech::{self, TerminalSpeech};

/// Speak every verse of the current chapter at the saved (or given) rate.
pub async fn run_read(config: &Config, rate: Option<f32>) -> Result<()> {
    let session = Session::open(config).await?;
    let Some(chapter) = session.reader.current_chapter() else {
        bail!("No chapter loaded at {}", session.reader.location());
    };
    let rate = rate.unwrap_or(session.prefs.tts_rate);
    if !(rate > 0.0 && rate <= 10.0) {
        bail!("Rate must be in (0, 10], got {}", rate);
    }
    let language = session
        .reader
        .language()
        .unwrap_or_else(|| "und".to_string());

    println!("{}", show::heading(&session.reader.snapshot().state));
    println!();

    let (engine, mut events) = TerminalSpeech::new(config.speech.words_per_minute);
    let mut sequence = ReadAloud::new(engine, chapter.verses, language, rate);
    speech::run_read_aloud(&mut sequence, &mut events).await?;
    Ok(())
}
