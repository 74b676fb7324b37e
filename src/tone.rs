// Without `audio` the synthesizer is only exercised by tests.
#![cfg_attr(not(feature = "audio"), allow(dead_code))]

use std::f32::consts::PI;
use std::io::{self, IsTerminal, Write};

use tracing::{debug, warn};

use crate::error::AudioError;

pub const SAMPLE_RATE: u32 = 44_100;
const SILENCE_GAIN: f32 = 0.01;

// ============================================================================
// Cues
// ============================================================================

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Cue {
    EnterWork,
    EnterRest,
}

/// Three-step chime: one oscillator whose pitch jumps at fixed offsets,
/// under a gain that decays exponentially from `peak` to near silence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    /// (frequency in Hz, start offset in seconds)
    pub notes: [(f32, f32); 3],
    pub peak: f32,
    pub duration: f32,
}

impl Cue {
    pub fn spec(self) -> ToneSpec {
        match self {
            Self::EnterWork => ToneSpec {
                notes: [(440.0, 0.0), (554.37, 0.2), (659.25, 0.4)],
                peak: 0.4,
                duration: 0.8,
            },
            Self::EnterRest => ToneSpec {
                notes: [(523.25, 0.0), (659.25, 0.3), (783.99, 0.6)],
                peak: 0.3,
                duration: 1.0,
            },
        }
    }
}

impl ToneSpec {
    pub fn frequency_at(&self, t: f32) -> f32 {
        self.notes
            .iter()
            .rev()
            .find(|(_, start)| t >= *start)
            .map(|(f, _)| *f)
            .unwrap_or(self.notes[0].0)
    }

    pub fn gain_at(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, self.duration);
        self.peak * (SILENCE_GAIN / self.peak).powf(t / self.duration)
    }

    /// Mono f32 samples. Phase is accumulated so pitch steps stay click-free.
    pub fn samples(&self, sample_rate: u32) -> Vec<f32> {
        let count = (self.duration * sample_rate as f32).round() as usize;
        let dt = 1.0 / sample_rate as f32;
        let mut phase = 0.0f32;
        let mut out = Vec::with_capacity(count);

        for i in 0..count {
            let t = i as f32 * dt;
            out.push(phase.sin() * self.gain_at(t));
            phase = (phase + 2.0 * PI * self.frequency_at(t) * dt) % (2.0 * PI);
        }
        out
    }
}

// ============================================================================
// Players
// ============================================================================

/// Fire-and-forget cue output. Failures are logged, never returned.
pub trait CuePlayer {
    fn play(&self, cue: Cue);
}

pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&self, cue: Cue) {
        debug!(?cue, "sound disabled");
    }
}

/// Terminal bell; used when there is no audio device or no `audio` feature.
pub struct BellPlayer;

impl BellPlayer {
    fn ring(cue: Cue) -> Result<(), AudioError> {
        let mut stdout = io::stdout();
        if !stdout.is_terminal() {
            return Err(AudioError::Unavailable("stdout is not a terminal".into()));
        }
        // Two rings mark the start of a rest.
        let bells = match cue {
            Cue::EnterWork => "\x07",
            Cue::EnterRest => "\x07\x07",
        };
        stdout
            .write_all(bells.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| AudioError::Playback(e.to_string()))
    }
}

impl CuePlayer for BellPlayer {
    fn play(&self, cue: Cue) {
        if let Err(e) = Self::ring(cue) {
            warn!(?cue, error = %e, "bell failed");
        }
    }
}

#[cfg(feature = "audio")]
pub use rodio_player::RodioPlayer;

#[cfg(feature = "audio")]
mod rodio_player {
    use rodio::{OutputStream, Sink, buffer::SamplesBuffer};
    use tracing::{debug, warn};

    use super::{Cue, CuePlayer, SAMPLE_RATE};
    use crate::error::AudioError;

    pub(super) fn buffer(cue: Cue) -> SamplesBuffer<f32> {
        SamplesBuffer::new(1, SAMPLE_RATE, cue.spec().samples(SAMPLE_RATE))
    }

    /// Synthesizes each cue on demand and plays it on a detached thread.
    pub struct RodioPlayer;

    impl RodioPlayer {
        /// Checks that a default output device can be opened.
        pub fn check_output() -> Result<(), AudioError> {
            OutputStream::try_default()
                .map(|_| ())
                .map_err(|e| AudioError::Unavailable(e.to_string()))
        }

        fn render(cue: Cue) -> Result<(), AudioError> {
            let (_stream, handle) =
                OutputStream::try_default().map_err(|e| AudioError::Unavailable(e.to_string()))?;
            let sink = Sink::try_new(&handle).map_err(|e| AudioError::Playback(e.to_string()))?;
            sink.append(buffer(cue));
            sink.sleep_until_end();
            Ok(())
        }
    }

    impl CuePlayer for RodioPlayer {
        fn play(&self, cue: Cue) {
            debug!(?cue, "playing chime");
            std::thread::spawn(move || {
                if let Err(e) = Self::render(cue) {
                    warn!(?cue, error = %e, "chime playback failed");
                }
            });
        }
    }
}

/// Best available player for this build.
pub fn default_player(sound: bool) -> Box<dyn CuePlayer> {
    if sound { audible_player() } else { Box::new(SilentPlayer) }
}

#[cfg(feature = "audio")]
fn audible_player() -> Box<dyn CuePlayer> {
    match RodioPlayer::check_output() {
        Ok(()) => Box::new(RodioPlayer),
        Err(e) => {
            warn!(error = %e, "no audio output, falling back to the terminal bell");
            Box::new(BellPlayer)
        }
    }
}

#[cfg(not(feature = "audio"))]
fn audible_player() -> Box<dyn CuePlayer> {
    Box::new(BellPlayer)
}
