//! Native playback primitive.

use async_trait::async_trait;
use reverie_core::{EngineStatus, Result};
use tokio::sync::watch;

/// A native audio player holding at most one loaded resource.
///
/// Loading a new resource stops whatever was playing before. Status changes
/// are published on a watch channel for as long as a resource is loaded.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Open `uri` and prepare it for playback at position 0, paused.
    ///
    /// Publishes a status with `did_just_finish` cleared before returning.
    async fn load(&self, uri: &str) -> Result<()>;

    /// Start or resume playback of the loaded resource.
    fn play(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    fn pause(&self) -> Result<()>;

    /// Move to `position_ms` within the loaded resource.
    fn seek_to(&self, position_ms: u64) -> Result<()>;

    /// Subscribe to status updates.
    fn subscribe(&self) -> watch::Receiver<EngineStatus>;
}
