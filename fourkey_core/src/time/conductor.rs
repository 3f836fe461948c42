use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;
use fourkey_schema::Millis;

/// Song clock for the game loop.
///
/// The audio thread publishes its playback position in ms; between those
/// coarse updates the conductor extrapolates with the host's clock.
pub struct Conductor {
    audio_position: Arc<AtomicF64>,
    last_audio_ms: Millis,
    last_update_ms: Millis,
    /// Added to every reading; compensates output latency.
    offset_ms: Millis,
}

impl Conductor {
    pub fn new(audio_position: Arc<AtomicF64>) -> Self {
        Self {
            audio_position,
            last_audio_ms: 0.0,
            last_update_ms: 0.0,
            offset_ms: 0.0,
        }
    }

    pub fn with_offset(mut self, offset_ms: Millis) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    /// Resynchronizes with the audio thread.
    pub fn update(&mut self, host_now_ms: Millis) {
        self.last_audio_ms = self.audio_position.load(Ordering::Acquire);
        self.last_update_ms = host_now_ms;
    }

    pub fn time_ms(&self, host_now_ms: Millis) -> Millis {
        let elapsed = host_now_ms - self.last_update_ms;
        self.last_audio_ms + elapsed + self.offset_ms
    }
}
