//! Read-aloud sequencing over a chapter's verse list.
//!
//! [`ReadAloud`] speaks verses strictly in order, one utterance at a time,
//! through an injected [`SpeechEngine`]. The engine reports completion
//! asynchronously; the host feeds those reports back as [`SpeechEvent`]s via
//! [`ReadAloud::handle`]. Each utterance carries an id and events for any
//! utterance other than the one in flight are ignored, so a late `Ended`
//! from a cancelled utterance cannot advance the sequence.
//!
//! ```text
//! stopped ──play──▶ playing ──pause──▶ paused
//!    ▲                │  ▲               │
//!    │                │  └────resume─────┘
//!    └──stop / end / error──┘
//! ```

use serde::Serialize;

use crate::error::SpeechError;
use crate::models::Verse;

/// One verse handed to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub verse: u32,
    pub text: String,
    pub language: String,
    pub rate: f32,
}

/// Completion report for an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Ended { utterance: u64 },
    Failed { utterance: u64, error: SpeechError },
}

/// Platform speech capability.
///
/// `speak` starts an utterance and returns immediately; completion arrives
/// later as a [`SpeechEvent`]. `is_speaking` stays true while an utterance
/// is paused.
pub trait SpeechEngine {
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
    fn is_speaking(&self) -> bool;
    fn is_paused(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Sequential read-aloud over a snapshot of verses.
pub struct ReadAloud<E: SpeechEngine> {
    engine: E,
    verses: Vec<Verse>,
    language: String,
    rate: f32,
    state: PlaybackState,
    index: usize,
    active_verse: Option<u32>,
    in_flight: Option<u64>,
    next_id: u64,
}

impl<E: SpeechEngine> ReadAloud<E> {
    pub fn new(engine: E, verses: Vec<Verse>, language: impl Into<String>, rate: f32) -> Self {
        Self {
            engine,
            verses,
            language: language.into(),
            rate,
            state: PlaybackState::Stopped,
            index: 0,
            active_verse: None,
            in_flight: None,
            next_id: 1,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Verse number currently being spoken (or paused on).
    pub fn active_verse(&self) -> Option<u32> {
        self.active_verse
    }

    /// Index into the verse list of the next verse to finish.
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Applies from the next utterance on.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    /// Swap in a new verse list. Any playback is stopped first.
    pub fn replace_verses(&mut self, verses: Vec<Verse>, language: impl Into<String>) {
        self.stop();
        self.verses = verses;
        self.language = language.into();
    }

    /// Start from the first verse.
    pub fn play(&mut self) -> Result<(), SpeechError> {
        self.speak_from(0)
    }

    /// Pause the current utterance. Does nothing unless the engine is
    /// actually speaking.
    pub fn pause(&mut self) {
        if self.engine.is_speaking() {
            self.engine.pause();
            self.state = PlaybackState::Paused;
        }
    }

    /// Continue a paused utterance. Engines that lost their pause state are
    /// restarted from the last recorded verse instead.
    pub fn resume(&mut self) -> Result<(), SpeechError> {
        if self.engine.is_paused() {
            self.engine.resume();
            self.state = PlaybackState::Playing;
            Ok(())
        } else {
            self.speak_from(self.index)
        }
    }

    /// Cancel everything and rewind. Safe to call in any state.
    pub fn stop(&mut self) {
        self.engine.cancel();
        self.state = PlaybackState::Stopped;
        self.active_verse = None;
        self.in_flight = None;
        self.index = 0;
    }

    /// Pause if playing, resume if paused, otherwise play from the start.
    pub fn toggle(&mut self) -> Result<(), SpeechError> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else if self.engine.is_paused() {
            self.resume()
        } else {
            self.play()
        }
    }

    /// Feed an engine completion report into the sequence.
    ///
    /// A failure stops the whole sequence and is returned to the caller.
    pub fn handle(&mut self, event: SpeechEvent) -> Result<(), SpeechError> {
        let utterance = match &event {
            SpeechEvent::Ended { utterance } | SpeechEvent::Failed { utterance, .. } => *utterance,
        };
        if self.in_flight != Some(utterance) {
            tracing::debug!(utterance, "ignoring event for superseded utterance");
            return Ok(());
        }

        match event {
            SpeechEvent::Ended { .. } => {
                self.in_flight = None;
                self.index += 1;
                self.speak_next()
            }
            SpeechEvent::Failed { error, .. } => {
                tracing::warn!(%error, "utterance failed, stopping read-aloud");
                self.stop();
                Err(error)
            }
        }
    }

    fn speak_from(&mut self, start: usize) -> Result<(), SpeechError> {
        self.engine.cancel();
        self.in_flight = None;
        self.index = start;
        self.state = PlaybackState::Playing;
        self.speak_next()
    }

    fn speak_next(&mut self) -> Result<(), SpeechError> {
        let Some(verse) = self.verses.get(self.index) else {
            self.state = PlaybackState::Stopped;
            self.active_verse = None;
            self.index = 0;
            return Ok(());
        };

        let utterance = Utterance {
            id: self.next_id,
            verse: verse.verse,
            text: verse.text.clone(),
            language: self.language.clone(),
            rate: self.rate,
        };
        self.next_id += 1;
        self.active_verse = Some(verse.verse);
        self.in_flight = Some(utterance.id);

        if let Err(error) = self.engine.speak(utterance) {
            self.stop();
            return Err(error);
        }
        Ok(())
    }
}
