//! Events published by the coordinator.

use reverie_core::{Error, ErrorKind, PlaybackContext, PlaybackIdentity};
use serde::Serialize;

use crate::session::PlaybackPhase;

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// The session moved to a new phase.
    StateChanged {
        phase: PlaybackPhase,
        target: Option<PlaybackIdentity>,
    },
    /// A request failed; show this to the user once.
    Notice(PlaybackNotice),
}

/// User-visible report of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackNotice {
    pub item_id: String,
    pub context: PlaybackContext,
    #[serde(skip)]
    pub kind: ErrorKind,
    pub message: String,
}

impl PlaybackNotice {
    pub(crate) fn from_error(target: &PlaybackIdentity, error: &Error) -> Self {
        let kind = error.kind();
        let message = if error.is_transient() {
            format!("{} Tap to try again.", kind.user_message())
        } else {
            kind.user_message().to_string()
        };
        Self {
            item_id: target.item_id.clone(),
            context: target.context,
            kind,
            message,
        }
    }
}
