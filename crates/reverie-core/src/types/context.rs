//! Playback contexts: which UI surface owns the shared player.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The UI surface a playback request came from.
///
/// The same item can be on screen in several surfaces at once, so the
/// context is part of the identity of a playback target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackContext {
    /// A card in the social feed.
    Feed,
    /// A row in the user's own journal.
    Journal,
    /// The dream detail modal.
    Modal,
    /// The record-preview screen shown after recording.
    Preview,
    /// A dream opened from a notification.
    NotificationDeepLink,
}

impl PlaybackContext {
    pub const ALL: [Self; 5] = [
        Self::Feed,
        Self::Journal,
        Self::Modal,
        Self::Preview,
        Self::NotificationDeepLink,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Journal => "journal",
            Self::Modal => "modal",
            Self::Preview => "preview",
            Self::NotificationDeepLink => "notification",
        }
    }
}

impl fmt::Display for PlaybackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackContext {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feed" => Ok(Self::Feed),
            "journal" => Ok(Self::Journal),
            "modal" => Ok(Self::Modal),
            "preview" => Ok(Self::Preview),
            "notification" | "notification_deep_link" => Ok(Self::NotificationDeepLink),
            other => Err(Error::InvalidArgument(format!(
                "unknown playback context: {other}"
            ))),
        }
    }
}

/// An (item, context) pair: the key the shared player is assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlaybackIdentity {
    pub item_id: String,
    pub context: PlaybackContext,
}

impl PlaybackIdentity {
    pub fn new(item_id: impl Into<String>, context: PlaybackContext) -> Self {
        Self {
            item_id: item_id.into(),
            context,
        }
    }

    /// Check whether this identity refers to the given item in the given context.
    pub fn matches(&self, item_id: &str, context: PlaybackContext) -> bool {
        self.item_id == item_id && self.context == context
    }
}

impl fmt::Display for PlaybackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.item_id, self.context)
    }
}
