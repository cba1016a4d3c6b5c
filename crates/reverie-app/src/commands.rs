//! Subcommand implementations.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reverie_access::{AccessResolver, StorageClient};
use reverie_audio::{AudioEngine, HeadlessPlayer};
use reverie_core::{PlayableItem, PlaybackContext};
use reverie_playback::{
    CardView, CoordinatorEvent, PlaybackCoordinator, PlaybackPhase, RequestOutcome,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::TargetArgs;

/// How often the card line is redrawn.
const RENDER_INTERVAL: Duration = Duration::from_millis(250);

/// Build the item the arguments describe, and the viewer to resolve it for.
fn target_item(config: &AppConfig, target: &TargetArgs) -> (PlayableItem, Option<String>) {
    let viewer = target.viewer.clone().or_else(|| config.viewer_id.clone());
    let owner = target
        .owner
        .clone()
        .or_else(|| viewer.clone())
        .unwrap_or_default();

    let mut item = PlayableItem::new(target.id.as_str(), target.audio_ref.as_str(), owner);
    if target.private {
        item = item.private();
    }
    if let Some(secs) = target.duration {
        item = item.with_duration_hint(secs * 1000);
    }
    (item, viewer)
}

fn build_resolver(config: &AppConfig) -> Result<AccessResolver> {
    let storage = StorageClient::new(
        &config.storage_url,
        &config.api_key,
        config.access_token.as_deref(),
    )
    .context("Failed to create storage client")?;

    Ok(AccessResolver::new(Arc::new(storage))
        .with_bucket(config.storage_bucket.as_str())
        .with_timeout(config.resolve_timeout())
        .with_expiry(config.signed_url_expiry()))
}

pub async fn resolve(config: &AppConfig, target: &TargetArgs) -> Result<()> {
    let (item, viewer) = target_item(config, target);
    let resolver = build_resolver(config)?;

    let url = resolver
        .resolve(&item, viewer.as_deref())
        .await
        .with_context(|| format!("Could not resolve {}", item.raw_audio_ref))?;

    debug!(signed = url.is_signed(), "Resolved {}", item.id);
    println!("{}", url.as_str());
    Ok(())
}

pub async fn play(
    config: &AppConfig,
    target: &TargetArgs,
    context: PlaybackContext,
    json: bool,
) -> Result<ExitCode> {
    let (item, viewer) = target_item(config, target);

    let coordinator = Arc::new(build_coordinator(config, viewer)?);
    let listener = coordinator.spawn_status_listener();
    let mut events = coordinator.subscribe();

    info!("Playing {} in {}", item.id, context);
    let outcome = coordinator.request(&item, context).await;

    let (notices, started) = settle_request(outcome, &mut events);
    for notice in &notices {
        eprintln!("{notice}");
    }
    if !started {
        listener.abort();
        return Ok(ExitCode::FAILURE);
    }

    let mut ticker = tokio::time::interval(RENDER_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                render(&coordinator.card(&item, context), json);
                if coordinator.session().phase() == PlaybackPhase::Idle {
                    break;
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted");
                coordinator.reset();
                break;
            }
        }
    }

    if !json {
        println!();
    }
    listener.abort();
    Ok(ExitCode::SUCCESS)
}

fn build_coordinator(config: &AppConfig, viewer: Option<String>) -> Result<PlaybackCoordinator> {
    let player = HeadlessPlayer::new().context("Failed to create player")?;
    let engine = AudioEngine::new(Arc::new(player)).with_load_timeout(config.load_timeout());
    let coordinator = PlaybackCoordinator::new(engine, build_resolver(config)?);
    Ok(match viewer {
        Some(viewer) => coordinator.with_viewer(viewer),
        None => coordinator,
    })
}

/// Collect the notices a finished request produced and report whether it
/// started playback.
///
/// A failed request is shown to the user only through its notice.
fn settle_request(
    outcome: reverie_core::Result<RequestOutcome>,
    events: &mut broadcast::Receiver<CoordinatorEvent>,
) -> (Vec<String>, bool) {
    let notices = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            CoordinatorEvent::Notice(notice) => Some(notice.message),
            CoordinatorEvent::StateChanged { .. } => None,
        })
        .collect();

    let started = match outcome {
        Ok(RequestOutcome::Started) => true,
        Ok(other) => {
            warn!(?other, "Unexpected outcome for a fresh request");
            false
        }
        Err(e) => {
            debug!("Request failed: {e}");
            false
        }
    };
    (notices, started)
}

fn render(view: &CardView, json: bool) {
    if json {
        match serde_json::to_string(view) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("Failed to encode card: {e}"),
        }
        return;
    }

    let state = if view.is_loading {
        "..."
    } else if view.is_playing {
        "|>"
    } else {
        "||"
    };
    print!(
        "\r{state} {} / {}  {:5.1}%",
        view.current_time_label, view.duration_label, view.progress_percent
    );
    // Best-effort redraw; a closed stdout ends the process anyway.
    let _ = std::io::Write::flush(&mut std::io::stdout());
}
