//! Playback time formatting.

use serde::{Deserialize, Serialize};

/// Playback position in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PlaybackTime(pub u64);

impl PlaybackTime {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    pub const fn as_seconds(&self) -> u64 {
        self.0 / 1000
    }

    /// Format as M:SS or H:MM:SS.
    pub fn format(&self) -> String {
        let total_secs = self.as_seconds();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

impl From<u64> for PlaybackTime {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}
