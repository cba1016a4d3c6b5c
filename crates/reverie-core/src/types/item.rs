//! Playable item type: a dream recording as read from the repository.

use serde::{Deserialize, Serialize};

use super::{PlaybackContext, PlaybackIdentity};

/// A piece of audio content that can be played.
///
/// Read from the dream repository and never mutated by playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayableItem {
    /// Dream ID.
    pub id: String,
    /// Stored audio reference: a public URL or a storage object path.
    pub raw_audio_ref: String,
    /// Whether the audio lives in private storage.
    pub is_private: bool,
    /// User ID of the dream's author.
    pub owner_id: String,
    /// Recording length reported by the repository, if known.
    #[serde(default)]
    pub duration_hint_ms: Option<u64>,
}

impl PlayableItem {
    /// Create a public item.
    pub fn new(
        id: impl Into<String>,
        raw_audio_ref: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            raw_audio_ref: raw_audio_ref.into(),
            is_private: false,
            owner_id: owner_id.into(),
            duration_hint_ms: None,
        }
    }

    /// Mark the item as stored privately.
    #[must_use]
    pub const fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    #[must_use]
    pub const fn with_duration_hint(mut self, duration_ms: u64) -> Self {
        self.duration_hint_ms = Some(duration_ms);
        self
    }

    /// The playback identity of this item when played from `context`.
    pub fn identity(&self, context: PlaybackContext) -> PlaybackIdentity {
        PlaybackIdentity::new(self.id.clone(), context)
    }

    /// Whether `requester` may obtain a playable URL for this item.
    pub fn is_accessible_by(&self, requester: Option<&str>) -> bool {
        !self.is_private || requester.is_some_and(|r| r == self.owner_id)
    }
}
