//! Audio engine wrapping a single native player.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reverie_core::{EngineStatus, Error, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::player::MediaPlayer;

/// Default upper bound for opening a resource.
const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// The one playback resource shared by every play affordance.
///
/// Wraps a [`MediaPlayer`], tracks which URL is loaded, bounds load time and
/// exposes seeking as a fraction of the loaded resource.
pub struct AudioEngine {
    /// Native player.
    player: Arc<dyn MediaPlayer>,
    /// URL of the loaded resource.
    loaded: Mutex<Option<String>>,
    /// Latest status from the player.
    status_rx: watch::Receiver<EngineStatus>,
    /// Upper bound for `load`.
    load_timeout: Duration,
}

impl AudioEngine {
    /// Create a new engine around a native player.
    pub fn new(player: Arc<dyn MediaPlayer>) -> Self {
        let status_rx = player.subscribe();
        Self {
            player,
            loaded: Mutex::new(None),
            status_rx,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// Set the upper bound for opening a resource.
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Load a resource, replacing (and stopping) whatever was loaded.
    pub async fn load(&self, url: &str) -> Result<()> {
        if self.loaded.lock().take().is_some() {
            if let Err(e) = self.player.pause() {
                warn!("Failed to stop previous resource: {e}");
            }
        }

        debug!("Loading {url}");
        match tokio::time::timeout(self.load_timeout, self.player.load(url)).await {
            Ok(Ok(())) => {
                info!("Loaded {url}");
                *self.loaded.lock() = Some(url.to_string());
                Ok(())
            }
            Ok(Err(e @ (Error::LoadFailed(_) | Error::Timeout(_)))) => Err(e),
            Ok(Err(e)) => Err(Error::LoadFailed(e.to_string())),
            Err(_) => {
                warn!("Load of {url} exceeded {:?}", self.load_timeout);
                Err(Error::Timeout(self.load_timeout))
            }
        }
    }

    /// Start or resume playback.
    pub fn play(&self) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::LoadFailed("no resource loaded".to_string()));
        }
        self.player.play()
    }

    /// Pause playback. A no-op when nothing is loaded.
    pub fn pause(&self) -> Result<()> {
        if !self.is_loaded() {
            return Ok(());
        }
        self.player.pause()
    }

    /// Seek to a fraction (`0.0..=1.0`) of the loaded resource.
    pub fn seek_to(&self, fraction: f64) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::InvalidArgument("cannot seek: nothing loaded".into()));
        }
        if !fraction.is_finite() {
            return Err(Error::InvalidArgument(format!("invalid seek fraction {fraction}")));
        }
        let duration_ms = self.status().duration_ms;
        let position_ms = (fraction.clamp(0.0, 1.0) * duration_ms as f64).round() as u64;
        debug!("Seeking to {position_ms} ms of {duration_ms} ms");
        self.player.seek_to(position_ms)
    }

    /// Whether a resource is currently loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// URL of the loaded resource.
    pub fn loaded_url(&self) -> Option<String> {
        self.loaded.lock().clone()
    }

    /// Latest status snapshot.
    pub fn status(&self) -> EngineStatus {
        *self.status_rx.borrow()
    }

    /// Subscribe to status updates.
    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status_rx.clone()
    }
}
