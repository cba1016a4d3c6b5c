//! Headless player: fetches and probes audio, then advances a wall clock.
//!
//! Used where no output device is available (CLI, CI). Timing uses the tokio
//! clock so it honours paused time in tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reverie_core::{EngineStatus, Error, HttpError, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};
use url::Url;

use crate::player::MediaPlayer;
use crate::probe::probe_audio;

/// Default interval between status updates while playing.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Default timeout for fetching a resource over HTTP.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Position bookkeeping for the loaded resource.
#[derive(Debug, Default)]
struct Clock {
    loaded: bool,
    duration_ms: u64,
    /// Position when playback last started or was paused.
    base_ms: u64,
    /// Set while playing.
    started_at: Option<Instant>,
}

impl Clock {
    fn position_ms(&self) -> u64 {
        let elapsed = self
            .started_at
            .map_or(0, |at| at.elapsed().as_millis() as u64);
        (self.base_ms + elapsed).min(self.duration_ms)
    }

    fn status(&self, did_just_finish: bool) -> EngineStatus {
        EngineStatus {
            current_time_ms: self.position_ms(),
            duration_ms: self.duration_ms,
            is_playing: self.started_at.is_some(),
            did_just_finish,
        }
    }
}

/// A [`MediaPlayer`] without an output device.
pub struct HeadlessPlayer {
    http: reqwest::Client,
    clock: Arc<Mutex<Clock>>,
    status_tx: Arc<watch::Sender<EngineStatus>>,
    tick_interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessPlayer {
    /// Create a new headless player.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            clock: Arc::new(Mutex::new(Clock::default())),
            status_tx: Arc::new(watch::Sender::new(EngineStatus::idle())),
            tick_interval: DEFAULT_TICK_INTERVAL,
            ticker: Mutex::new(None),
        })
    }

    /// Set how often status is published while playing.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    async fn fetch(&self, uri: &str) -> Result<(Bytes, Option<String>)> {
        match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                let response = self.http.get(url).send().await.map_err(|e| {
                    if e.is_timeout() {
                        Error::Http(HttpError::Timeout)
                    } else {
                        Error::Http(HttpError::ConnectionFailed(e.to_string()))
                    }
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Error::LoadFailed(format!("HTTP {status} for {uri}")));
                }

                let content_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                let data = response
                    .bytes()
                    .await
                    .map_err(|e| Error::LoadFailed(format!("Failed to read response: {e}")))?;

                let hint = content_type.or_else(|| extension_of(uri));
                Ok((data, hint))
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::LoadFailed(format!("Invalid file URL: {uri}")))?;
                read_file(path).await
            }
            Ok(url) => Err(Error::LoadFailed(format!(
                "Unsupported URL scheme: {}",
                url.scheme()
            ))),
            Err(_) => read_file(PathBuf::from(uri)).await,
        }
    }

    fn publish(&self, status: EngineStatus) {
        self.status_tx.send_replace(status);
    }

    fn ensure_ticker(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let clock = self.clock.clone();
        let status_tx = self.status_tx.clone();
        let interval = self.tick_interval;

        *ticker = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let mut state = clock.lock();
                if state.started_at.is_none() {
                    continue;
                }

                if state.position_ms() >= state.duration_ms {
                    state.base_ms = state.duration_ms;
                    state.started_at = None;
                    info!("Playback finished");
                    status_tx.send_replace(state.status(true));
                } else {
                    let status = state.status(false);
                    trace!("Position {} ms", status.current_time_ms);
                    status_tx.send_replace(status);
                }
            }
        }));
    }
}

impl Drop for HeadlessPlayer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.abort();
        }
    }
}

#[async_trait]
impl MediaPlayer for HeadlessPlayer {
    async fn load(&self, uri: &str) -> Result<()> {
        {
            let mut clock = self.clock.lock();
            *clock = Clock::default();
            self.publish(clock.status(false));
        }

        let (data, hint) = self.fetch(uri).await?;
        debug!("Fetched {} bytes, hint: {:?}", data.len(), hint);

        let probed = tokio::task::spawn_blocking(move || probe_audio(data, hint.as_deref()))
            .await
            .map_err(|e| Error::Internal(format!("Probe task failed: {e}")))??;

        let mut clock = self.clock.lock();
        *clock = Clock {
            loaded: true,
            duration_ms: probed.duration_ms,
            ..Clock::default()
        };
        self.publish(clock.status(false));
        drop(clock);

        self.ensure_ticker();
        Ok(())
    }

    fn play(&self) -> Result<()> {
        let mut clock = self.clock.lock();
        if !clock.loaded {
            return Err(Error::LoadFailed("no resource loaded".to_string()));
        }
        if clock.started_at.is_none() {
            if clock.base_ms >= clock.duration_ms {
                clock.base_ms = 0;
            }
            clock.started_at = Some(Instant::now());
        }
        self.publish(clock.status(false));
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut clock = self.clock.lock();
        if clock.started_at.is_some() {
            clock.base_ms = clock.position_ms();
            clock.started_at = None;
        }
        self.publish(clock.status(false));
        Ok(())
    }

    fn seek_to(&self, position_ms: u64) -> Result<()> {
        let mut clock = self.clock.lock();
        if !clock.loaded {
            return Err(Error::InvalidArgument("cannot seek: nothing loaded".into()));
        }
        clock.base_ms = position_ms.min(clock.duration_ms);
        if clock.started_at.is_some() {
            clock.started_at = Some(Instant::now());
        }
        self.publish(clock.status(false));
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }
}

async fn read_file(path: PathBuf) -> Result<(Bytes, Option<String>)> {
    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| Error::LoadFailed(format!("Failed to read {}: {e}", path.display())))?;
    let hint = path
        .extension()
        .and_then(|e| e.to_str())
        .map(String::from);
    Ok((Bytes::from(data), hint))
}

fn extension_of(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    let last = url.path_segments()?.next_back()?;
    let (_, ext) = last.rsplit_once('.')?;
    Some(ext.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::probe::silent_wav;
    use std::io::Write;

    fn wav_file(millis: u32) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&silent_wav(millis)).unwrap();
        file
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(
            extension_of("https://x.example/o/sign/a/b.m4a?token=1").as_deref(),
            Some("m4a")
        );
        assert_eq!(extension_of("https://x.example/o/noext"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_pause_and_finish() {
        let file = wav_file(1000);
        let player = HeadlessPlayer::new().unwrap();
        let mut status = player.subscribe();

        player.load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(status.borrow_and_update().duration_ms, 1000);

        player.play().unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        player.pause().unwrap();
        let paused = *status.borrow_and_update();
        assert!(!paused.is_playing);
        assert!(!paused.did_just_finish);
        assert!((350..=450).contains(&paused.current_time_ms));

        // Paused time does not advance or finish.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(player.clock.lock().position_ms(), paused.current_time_ms);
        assert!(!status.borrow().did_just_finish);

        player.play().unwrap();
        tokio::time::sleep(Duration::from_millis(800)).await;
        let finished = *status.borrow();
        assert!(finished.did_just_finish);
        assert!(!finished.is_playing);
        assert_eq!(finished.current_time_ms, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_resets_position() {
        let first = wav_file(2000);
        let second = wav_file(1000);
        let player = HeadlessPlayer::new().unwrap();

        player.load(first.path().to_str().unwrap()).await.unwrap();
        player.play().unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        player.load(second.path().to_str().unwrap()).await.unwrap();
        let status = *player.subscribe().borrow();
        assert_eq!(status.current_time_ms, 0);
        assert_eq!(status.duration_ms, 1000);
        assert!(!status.is_playing);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let player = HeadlessPlayer::new().unwrap();
        let err = player.load("/nonexistent/dream.m4a").await.unwrap_err();
        assert!(matches!(err, Error::LoadFailed(_)));
        assert!(player.play().is_err());
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration() {
        let file = wav_file(1000);
        let player = HeadlessPlayer::new().unwrap();
        player.load(file.path().to_str().unwrap()).await.unwrap();

        player.seek_to(5000).unwrap();
        assert_eq!(player.subscribe().borrow().current_time_ms, 1000);
        player.seek_to(250).unwrap();
        assert_eq!(player.subscribe().borrow().current_time_ms, 250);
    }
}
