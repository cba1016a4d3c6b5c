//! Engine status reported while a resource is loaded.

use serde::{Deserialize, Serialize};

/// Snapshot of the audio engine's playback status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineStatus {
    /// Current position in milliseconds.
    pub current_time_ms: u64,
    /// Length of the loaded resource in milliseconds (0 while unknown).
    pub duration_ms: u64,
    /// Whether audio is currently advancing.
    pub is_playing: bool,
    /// Set once when playback reaches the end of the resource.
    pub did_just_finish: bool,
}

impl EngineStatus {
    /// Status of an engine with nothing loaded.
    pub const fn idle() -> Self {
        Self {
            current_time_ms: 0,
            duration_ms: 0,
            is_playing: false,
            did_just_finish: false,
        }
    }

    /// Fraction of the resource played, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.current_time_ms as f64 / self.duration_ms as f64).clamp(0.0, 1.0)
    }
}
