//! Core domain types for Reverie playback.

pub mod context;
pub mod item;
pub mod status;
pub mod time;

pub use context::{PlaybackContext, PlaybackIdentity};
pub use item::PlayableItem;
pub use status::EngineStatus;
pub use time::PlaybackTime;
