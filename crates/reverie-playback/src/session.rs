//! Shared playback session.

use reverie_core::{PlaybackContext, PlaybackIdentity};
use serde::Serialize;

/// Where the coordinator is in its state machine.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    /// Transient: a request failed and a notice is being surfaced.
    Errored,
}

/// The one playback session shared by all surfaces.
///
/// Readable by anyone; only the coordinator mutates it.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Session {
    phase: PlaybackPhase,
    /// Target that is playing or paused.
    active: Option<PlaybackIdentity>,
    /// Target whose URL or resource is being fetched.
    loading: Option<PlaybackIdentity>,
    /// Bumped by every new request and every reset.
    sequence_token: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub const fn active(&self) -> Option<&PlaybackIdentity> {
        self.active.as_ref()
    }

    pub fn active_item_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.item_id.as_str())
    }

    pub fn active_context(&self) -> Option<PlaybackContext> {
        self.active.as_ref().map(|a| a.context)
    }

    pub const fn loading(&self) -> Option<&PlaybackIdentity> {
        self.loading.as_ref()
    }

    pub fn loading_item_id(&self) -> Option<&str> {
        self.loading.as_ref().map(|l| l.item_id.as_str())
    }

    pub const fn sequence_token(&self) -> u64 {
        self.sequence_token
    }

    /// Whether `token` belongs to the most recent request.
    pub const fn is_current(&self, token: u64) -> bool {
        self.sequence_token == token
    }

    /// Whether the given target is playing or paused.
    pub fn is_active(&self, item_id: &str, context: PlaybackContext) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.matches(item_id, context))
    }

    pub fn is_loading(&self, item_id: &str, context: PlaybackContext) -> bool {
        self.loading
            .as_ref()
            .is_some_and(|l| l.matches(item_id, context))
    }

    pub fn is_playing(&self, item_id: &str, context: PlaybackContext) -> bool {
        self.phase == PlaybackPhase::Playing && self.is_active(item_id, context)
    }

    /// Start a new request for `target` and return its token.
    pub(crate) fn begin_request(&mut self, target: PlaybackIdentity) -> u64 {
        self.sequence_token += 1;
        self.phase = PlaybackPhase::Loading;
        self.active = None;
        self.loading = Some(target);
        self.sequence_token
    }

    /// Promote the loading target to playing.
    pub(crate) fn mark_playing(&mut self) {
        if let Some(target) = self.loading.take() {
            self.active = Some(target);
        }
        self.phase = PlaybackPhase::Playing;
    }

    pub(crate) fn mark_paused(&mut self) {
        self.phase = PlaybackPhase::Paused;
    }

    pub(crate) fn mark_errored(&mut self) {
        self.phase = PlaybackPhase::Errored;
        self.active = None;
        self.loading = None;
    }

    /// Back to idle, keeping the token.
    pub(crate) fn clear(&mut self) {
        self.phase = PlaybackPhase::Idle;
        self.active = None;
        self.loading = None;
    }

    /// Back to idle and invalidate whatever request is in flight.
    pub(crate) fn invalidate(&mut self) {
        self.sequence_token += 1;
        self.clear();
    }
}
