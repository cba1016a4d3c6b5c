//! Playback coordinator: the single entry point for every play button.
//!
//! # Concurrency
//!
//! Only `AccessResolver::resolve` and `AudioEngine::load` are awaited. All
//! session transitions happen synchronously under the session lock, which is
//! never held across an await. A request captures the session's sequence
//! token when it starts and re-checks it for equality after every await; on
//! mismatch the outcome is dropped with no state change and no notice.
//!
//! Loads are serialised by `load_lock`, so two requests never open resources
//! on the engine at the same time.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use reverie_access::AccessResolver;
use reverie_audio::AudioEngine;
use reverie_core::{EngineStatus, Error, PlayableItem, PlaybackContext, PlaybackIdentity, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::{CoordinatorEvent, PlaybackNotice};
use crate::projector::{project_item, CardView};
use crate::session::{PlaybackPhase, Session};

/// Capacity of the event channel; slow subscribers miss old events.
const EVENT_CAPACITY: usize = 64;

/// What a call to [`PlaybackCoordinator::request`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The target was loaded and is now playing from the start.
    Started,
    /// The target was playing and is now paused.
    Paused,
    /// The target was paused and is playing again from where it stopped.
    Resumed,
    /// A newer request or a reset overtook this one; nothing changed.
    Superseded,
}

/// Owns the shared session and the audio engine.
pub struct PlaybackCoordinator {
    engine: AudioEngine,
    resolver: AccessResolver,
    session: Mutex<Session>,
    /// Signed-in user, checked against private items' owners.
    viewer: RwLock<Option<String>>,
    load_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl PlaybackCoordinator {
    /// Create a coordinator with an empty session.
    pub fn new(engine: AudioEngine, resolver: AccessResolver) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            resolver,
            session: Mutex::new(Session::new()),
            viewer: RwLock::new(None),
            load_lock: tokio::sync::Mutex::new(()),
            events,
        }
    }

    /// Set the signed-in user.
    #[must_use]
    pub fn with_viewer(self, viewer: impl Into<String>) -> Self {
        *self.viewer.write() = Some(viewer.into());
        self
    }

    /// Change the signed-in user. Playback is reset if the user changes.
    pub fn set_viewer(&self, viewer: Option<String>) {
        let changed = {
            let mut current = self.viewer.write();
            let changed = *current != viewer;
            *current = viewer;
            changed
        };
        if changed {
            info!("Viewer changed, resetting playback");
            self.reset();
        }
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    /// Latest engine status.
    pub fn status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// Subscribe to state changes and failure notices.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// View state for a card showing `item` in `context`.
    pub fn card(&self, item: &PlayableItem, context: PlaybackContext) -> CardView {
        let session = self.session();
        project_item(&session, &self.engine.status(), item, context)
    }

    /// Handle a tap on the play button of `item` in `context`.
    ///
    /// Toggles pause/resume when the same target is already active; anything
    /// else loads the target from the start. A failure surfaces one notice,
    /// leaves the coordinator idle and is returned.
    pub async fn request(
        &self,
        item: &PlayableItem,
        context: PlaybackContext,
    ) -> Result<RequestOutcome> {
        let target = item.identity(context);

        let token = {
            let mut session = self.session.lock();
            match session.phase() {
                PlaybackPhase::Playing if session.active() == Some(&target) => {
                    if let Err(e) = self.engine.pause() {
                        warn!("Failed to pause {target}: {e}");
                    }
                    session.mark_paused();
                    self.emit_state(&session);
                    debug!("Paused {target}");
                    return Ok(RequestOutcome::Paused);
                }
                PlaybackPhase::Paused if session.active() == Some(&target) => {
                    if let Err(e) = self.engine.play() {
                        return self.fail(&mut session, &target, e);
                    }
                    session.mark_playing();
                    self.emit_state(&session);
                    debug!("Resumed {target}");
                    return Ok(RequestOutcome::Resumed);
                }
                _ => {}
            }

            if self.engine.is_loaded() {
                if let Err(e) = self.engine.pause() {
                    warn!("Failed to pause previous resource: {e}");
                }
            }
            let token = session.begin_request(target.clone());
            self.emit_state(&session);
            token
        };
        info!("Requesting {target} (token {token})");

        let viewer = self.viewer.read().clone();
        let url = match self.resolver.resolve(item, viewer.as_deref()).await {
            Ok(url) => url,
            Err(e) => return self.fail_if_current(token, &target, e),
        };
        if !self.is_current(token) {
            debug!("Discarding stale resolution for {target} (token {token})");
            return Ok(RequestOutcome::Superseded);
        }

        let _load = self.load_lock.lock().await;
        if !self.is_current(token) {
            debug!("Skipping load for superseded {target} (token {token})");
            return Ok(RequestOutcome::Superseded);
        }
        let loaded = self.engine.load(url.as_str()).await;

        let mut session = self.session.lock();
        if !session.is_current(token) {
            debug!("Discarding stale load for {target} (token {token})");
            return Ok(RequestOutcome::Superseded);
        }
        if let Err(e) = loaded.and_then(|()| self.engine.play()) {
            return self.fail(&mut session, &target, e);
        }
        session.mark_playing();
        self.emit_state(&session);
        info!("Playing {target}");
        Ok(RequestOutcome::Started)
    }

    /// Pause the active target if it is playing.
    pub fn pause(&self) -> bool {
        let mut session = self.session.lock();
        if session.phase() != PlaybackPhase::Playing {
            return false;
        }
        if let Err(e) = self.engine.pause() {
            warn!("Failed to pause: {e}");
        }
        session.mark_paused();
        self.emit_state(&session);
        true
    }

    /// Resume the active target if it is paused.
    pub fn resume(&self) -> Result<bool> {
        let mut session = self.session.lock();
        if session.phase() != PlaybackPhase::Paused {
            return Ok(false);
        }
        if let Err(e) = self.engine.play() {
            let target = session
                .active()
                .cloned()
                .ok_or_else(|| Error::Internal("paused without a target".to_string()))?;
            return self.fail(&mut session, &target, e).map(|_| false);
        }
        session.mark_playing();
        self.emit_state(&session);
        Ok(true)
    }

    /// Seek the active target to `fraction` of its length.
    pub fn seek_to(&self, fraction: f64) -> Result<()> {
        let session = self.session.lock();
        if !matches!(session.phase(), PlaybackPhase::Playing | PlaybackPhase::Paused) {
            return Err(Error::InvalidArgument("nothing to seek".to_string()));
        }
        self.engine.seek_to(fraction)
    }

    /// Stop playback and return to idle.
    ///
    /// Any request still resolving or loading is invalidated and its result
    /// will be ignored.
    pub fn reset(&self) {
        let mut session = self.session.lock();
        if let Err(e) = self.engine.pause() {
            warn!("Failed to pause on reset: {e}");
        }
        let was_idle = session.phase() == PlaybackPhase::Idle;
        session.invalidate();
        debug!("Reset (token {})", session.sequence_token());
        if !was_idle {
            self.emit_state(&session);
        }
    }

    /// React to `item` being deleted from the repository.
    pub fn item_removed(&self, item: &PlayableItem) {
        let involved = {
            let session = self.session.lock();
            session.active_item_id() == Some(item.id.as_str())
                || session.loading_item_id() == Some(item.id.as_str())
        };
        if involved {
            info!("Active dream {} was removed", item.id);
            self.reset();
        }
    }

    /// Apply an engine status update.
    ///
    /// A finish only counts if the engine still reports it under the session
    /// lock. Every load publishes a fresh status before its request can reach
    /// Playing, so a finish read before a newer load is ignored.
    ///
    /// Returns true if the update ended playback.
    pub fn handle_status(&self, status: &EngineStatus) -> bool {
        if !status.did_just_finish {
            return false;
        }
        let mut session = self.session.lock();
        if session.phase() != PlaybackPhase::Playing {
            return false;
        }
        if !self.engine.status().did_just_finish {
            debug!("Ignoring finish from a previous resource");
            return false;
        }
        info!(
            "Finished {}",
            session
                .active()
                .map_or_else(String::new, PlaybackIdentity::to_string)
        );
        session.clear();
        self.emit_state(&session);
        true
    }

    /// Follow the engine's status feed until the coordinator is dropped.
    pub fn spawn_status_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut status_rx = self.engine.subscribe();

        tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let status = *status_rx.borrow_and_update();
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                coordinator.handle_status(&status);
            }
            debug!("Status listener stopped");
        })
    }

    fn is_current(&self, token: u64) -> bool {
        self.session.lock().is_current(token)
    }

    fn fail_if_current(
        &self,
        token: u64,
        target: &PlaybackIdentity,
        error: Error,
    ) -> Result<RequestOutcome> {
        let mut session = self.session.lock();
        if !session.is_current(token) {
            debug!("Discarding stale failure for {target}: {error}");
            return Ok(RequestOutcome::Superseded);
        }
        self.fail(&mut session, target, error)
    }

    /// Errored, one notice, then idle.
    fn fail(
        &self,
        session: &mut Session,
        target: &PlaybackIdentity,
        error: Error,
    ) -> Result<RequestOutcome> {
        error!("Playback of {target} failed: {error}");
        session.mark_errored();
        self.emit_state(session);
        let _ = self
            .events
            .send(CoordinatorEvent::Notice(PlaybackNotice::from_error(target, &error)));
        session.clear();
        self.emit_state(session);
        Err(error)
    }

    fn emit_state(&self, session: &Session) {
        let target = session.active().or_else(|| session.loading()).cloned();
        // No subscribers is fine.
        let _ = self.events.send(CoordinatorEvent::StateChanged {
            phase: session.phase(),
            target,
        });
    }
}
