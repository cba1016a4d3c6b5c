//! Scripted collaborators for coordinator tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reverie_access::{AccessResolver, ObjectStorage, StoredObject};
use reverie_audio::{AudioEngine, MediaPlayer};
use reverie_core::{EngineStatus, Error, PlayableItem, Result};
use reverie_playback::{CoordinatorEvent, PlaybackCoordinator};
use tokio::sync::{broadcast, oneshot, Notify};

/// Length every fake resource reports.
pub const TRACK_MS: u64 = 60_000;

#[derive(Debug, Default)]
pub struct PlayerState {
    pub loaded: Option<String>,
    pub position_ms: u64,
    pub playing: bool,
    pub loads: Vec<String>,
    pub plays: usize,
    pub pauses: usize,
}

struct LoadGate {
    entered: Arc<Notify>,
    release: oneshot::Receiver<()>,
}

/// Test-side handle to a held engine load.
pub struct LoadHandle {
    entered: Arc<Notify>,
    release: oneshot::Sender<()>,
}

impl LoadHandle {
    /// Wait until the player has started loading this resource.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

/// In-memory player whose clock only moves when the test says so.
pub struct FakePlayer {
    pub state: Mutex<PlayerState>,
    failing: Mutex<HashSet<String>>,
    load_gates: Mutex<HashMap<String, LoadGate>>,
    status_tx: tokio::sync::watch::Sender<EngineStatus>,
}

impl FakePlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PlayerState::default()),
            failing: Mutex::new(HashSet::new()),
            load_gates: Mutex::new(HashMap::new()),
            status_tx: tokio::sync::watch::Sender::new(EngineStatus::idle()),
        })
    }

    /// Make loads of `uri` fail.
    pub fn fail_on(&self, uri: &str) {
        self.failing.lock().insert(uri.to_string());
    }

    /// Hold the next load of `uri` until the handle is released.
    pub fn hold_load(&self, uri: &str) -> LoadHandle {
        let entered = Arc::new(Notify::new());
        let (tx, rx) = oneshot::channel();
        self.load_gates.lock().insert(
            uri.to_string(),
            LoadGate {
                entered: entered.clone(),
                release: rx,
            },
        );
        LoadHandle {
            entered,
            release: tx,
        }
    }

    /// Advance the position of a playing resource.
    pub fn advance(&self, millis: u64) {
        let mut state = self.state.lock();
        if state.playing {
            state.position_ms = (state.position_ms + millis).min(TRACK_MS);
        }
        self.publish(&state, false);
    }

    /// Play to the end and report it.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.position_ms = TRACK_MS;
        state.playing = false;
        self.publish(&state, true);
    }

    pub fn position_ms(&self) -> u64 {
        self.state.lock().position_ms
    }

    pub fn load_count(&self) -> usize {
        self.state.lock().loads.len()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn publish(&self, state: &PlayerState, did_just_finish: bool) {
        self.status_tx.send_replace(EngineStatus {
            current_time_ms: state.position_ms,
            duration_ms: if state.loaded.is_some() { TRACK_MS } else { 0 },
            is_playing: state.playing,
            did_just_finish,
        });
    }
}

#[async_trait]
impl MediaPlayer for FakePlayer {
    async fn load(&self, uri: &str) -> Result<()> {
        let gate = self.load_gates.lock().remove(uri);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            let _ = gate.release.await;
        }
        tokio::task::yield_now().await;
        let mut state = self.state.lock();
        state.loads.push(uri.to_string());
        state.playing = false;
        state.position_ms = 0;
        if self.failing.lock().contains(uri) {
            state.loaded = None;
            self.publish(&state, false);
            return Err(Error::LoadFailed(format!("cannot open {uri}")));
        }
        state.loaded = Some(uri.to_string());
        self.publish(&state, false);
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.plays += 1;
        state.playing = true;
        self.publish(&state, false);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.pauses += 1;
        state.playing = false;
        self.publish(&state, false);
        Ok(())
    }

    fn seek_to(&self, position_ms: u64) -> Result<()> {
        let mut state = self.state.lock();
        state.position_ms = position_ms.min(TRACK_MS);
        self.publish(&state, false);
        Ok(())
    }

    fn subscribe(&self) -> tokio::sync::watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }
}

struct Gate {
    entered: Arc<Notify>,
    reply: oneshot::Receiver<Result<String>>,
}

/// Test-side handle to a held signing call.
pub struct GateHandle {
    entered: Arc<Notify>,
    reply: oneshot::Sender<Result<String>>,
}

impl GateHandle {
    /// Wait until the storage call for this object has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(self, url: &str) {
        let _ = self.reply.send(Ok(url.to_string()));
    }

    pub fn fail(self, error: Error) {
        let _ = self.reply.send(Err(error));
    }
}

/// Storage that signs instantly unless a call has been held by the test.
#[derive(Default)]
pub struct GatedStorage {
    gates: Mutex<HashMap<String, Gate>>,
    pub calls: Mutex<Vec<StoredObject>>,
    hang: Mutex<bool>,
}

impl GatedStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold the next signing call for `path` until the handle is released.
    pub fn hold(&self, path: &str) -> GateHandle {
        let entered = Arc::new(Notify::new());
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(
            path.to_string(),
            Gate {
                entered: entered.clone(),
                reply: rx,
            },
        );
        GateHandle { entered, reply: tx }
    }

    /// Make every signing call hang forever.
    pub fn hang(&self) {
        *self.hang.lock() = true;
    }
}

#[async_trait]
impl ObjectStorage for GatedStorage {
    async fn create_signed_url(&self, object: &StoredObject, _expiry: Duration) -> Result<String> {
        self.calls.lock().push(object.clone());
        let gate = self.gates.lock().remove(&object.path);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            return gate
                .reply
                .await
                .unwrap_or_else(|_| Err(Error::BackendUnavailable("gate dropped".into())));
        }
        let hang = *self.hang.lock();
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(format!("https://signed.example/{object}?token=1"))
    }

    fn public_url(&self, object: &StoredObject) -> Result<String> {
        Ok(format!("https://public.example/{object}"))
    }
}

pub struct Harness {
    pub coordinator: Arc<PlaybackCoordinator>,
    pub player: Arc<FakePlayer>,
    pub storage: Arc<GatedStorage>,
    pub events: broadcast::Receiver<CoordinatorEvent>,
}

impl Harness {
    /// Signed-in as `alice`.
    pub fn new() -> Self {
        let player = FakePlayer::new();
        let storage = GatedStorage::new();
        let coordinator = PlaybackCoordinator::new(
            AudioEngine::new(player.clone()),
            AccessResolver::new(storage.clone()).with_timeout(Duration::from_secs(10)),
        )
        .with_viewer("alice");
        let events = coordinator.subscribe();
        Self {
            coordinator: Arc::new(coordinator),
            player,
            storage,
            events,
        }
    }

    /// Drain received events.
    pub fn take_events(&mut self) -> Vec<CoordinatorEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn notices(&mut self) -> usize {
        self.take_events()
            .iter()
            .filter(|e| matches!(e, CoordinatorEvent::Notice(_)))
            .count()
    }
}

pub fn public_item(id: &str) -> PlayableItem {
    PlayableItem::new(id, format!("https://cdn.example/{id}.m4a"), "bob")
}

/// A private dream owned by `alice`, stored at `alice/<id>.m4a`.
pub fn private_item(id: &str) -> PlayableItem {
    PlayableItem::new(id, format!("alice/{id}.m4a"), "alice").private()
}
