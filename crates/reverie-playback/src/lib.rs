//! # reverie-playback
//!
//! Coordinates the single shared audio engine between every surface that
//! renders a play button.
//!
//! All requests go through [`PlaybackCoordinator`], the only writer of the
//! [`Session`]. Each request captures a sequence token; a resolution or load
//! that completes after a newer request (or a reset) was issued is dropped
//! without touching state. Cards render from [`projector::project`], a pure
//! function of the session and engine status.

pub mod coordinator;
pub mod events;
pub mod projector;
pub mod session;

pub use coordinator::{PlaybackCoordinator, RequestOutcome};
pub use events::{CoordinatorEvent, PlaybackNotice};
pub use projector::{project, project_item, CardView};
pub use session::{PlaybackPhase, Session};
