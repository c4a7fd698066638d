//! Terminal speech engine and the read-aloud driver loop.
//!
//! [`TerminalSpeech`] "speaks" a verse by printing it, then reports the
//! utterance as ended after the time a reader would need at the configured
//! pace: `words / (words_per_minute * rate)` minutes. Completion is a tokio
//! timer task, so pausing aborts the timer and remembers what was left.
//!
//! [`run_read_aloud`] starts a [`ReadAloud`] sequence and feeds engine
//! events back into it until the sequence stops or Ctrl-C is pressed.

use std::io::Write;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use lectio_core::error::SpeechError;
use lectio_core::read_aloud::{PlaybackState, ReadAloud, SpeechEngine, SpeechEvent, Utterance};

struct InFlight {
    id: u64,
    remaining: Duration,
    started: Instant,
    timer: Option<JoinHandle<()>>,
}

/// A [`SpeechEngine`] that prints verses to stdout at reading pace.
pub struct TerminalSpeech {
    words_per_minute: u32,
    events: mpsc::UnboundedSender<SpeechEvent>,
    current: Option<InFlight>,
}

impl TerminalSpeech {
    /// Create the engine and the receiver its completion events arrive on.
    pub fn new(words_per_minute: u32) -> (Self, mpsc::UnboundedReceiver<SpeechEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            words_per_minute: words_per_minute.max(1),
            events,
            current: None,
        };
        (engine, rx)
    }

    /// How long `text` takes to read at `rate`.
    pub fn duration_for(&self, text: &str, rate: f32) -> Duration {
        let words = text.split_whitespace().count().max(1) as f64;
        let per_minute = self.words_per_minute as f64 * rate.max(0.1) as f64;
        Duration::from_secs_f64(words * 60.0 / per_minute)
    }

    fn start_timer(&self, id: u64, after: Duration) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(SpeechEvent::Ended { utterance: id });
        })
    }
}

impl SpeechEngine for TerminalSpeech {
    fn speak(&mut self, utterance: Utterance) -> Result<(), SpeechError> {
        if self.events.is_closed() {
            return Err(SpeechError::Unavailable(
                "speech event receiver dropped".to_string(),
            ));
        }
        self.cancel();

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{:>4}  {}", utterance.verse, utterance.text)
            .and_then(|_| stdout.flush())
            .map_err(|e| SpeechError::Utterance {
                verse: utterance.verse,
                message: e.to_string(),
            })?;

        let remaining = self.duration_for(&utterance.text, utterance.rate);
        tracing::debug!(
            utterance = utterance.id,
            verse = utterance.verse,
            language = %utterance.language,
            ?remaining,
            "speaking"
        );
        self.current = Some(InFlight {
            id: utterance.id,
            remaining,
            started: Instant::now(),
            timer: Some(self.start_timer(utterance.id, remaining)),
        });
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(current) = self.current.as_mut() {
            if let Some(timer) = current.timer.take() {
                timer.abort();
                current.remaining = current.remaining.saturating_sub(current.started.elapsed());
            }
        }
    }

    fn resume(&mut self) {
        let Some((id, remaining)) = self
            .current
            .as_ref()
            .filter(|c| c.timer.is_none())
            .map(|c| (c.id, c.remaining))
        else {
            return;
        };
        let timer = self.start_timer(id, remaining);
        if let Some(current) = self.current.as_mut() {
            current.started = Instant::now();
            current.timer = Some(timer);
        }
    }

    fn cancel(&mut self) {
        if let Some(current) = self.current.take() {
            if let Some(timer) = current.timer {
                timer.abort();
            }
        }
    }

    fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    fn is_paused(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.timer.is_none())
    }
}

/// Play `sequence` from the first verse until it finishes, fails, or the
/// user interrupts with Ctrl-C.
pub async fn run_read_aloud<E: SpeechEngine>(
    sequence: &mut ReadAloud<E>,
    events: &mut mpsc::UnboundedReceiver<SpeechEvent>,
) -> Result<(), SpeechError> {
    sequence.play()?;
    while sequence.state() != PlaybackState::Stopped {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => sequence.handle(event)?,
                None => {
                    sequence.stop();
                    return Err(SpeechError::Unavailable("speech engine went away".to_string()));
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("read-aloud interrupted");
                sequence.stop();
            }
        }
    }
    // The engine still holds the finished utterance after the last Ended.
    sequence.stop();
    Ok(())
}
