//! # Reverie
//!
//! Terminal player for dream recordings. Drives the same playback
//! coordinator the feed and journal screens use.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use reverie_core::PlaybackContext;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "reverie", version, about = "Play dream recordings")]
struct Cli {
    /// Config file (defaults to the per-user config.toml)
    #[arg(short, long, env = "REVERIE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Backend project URL (overrides storage_url)
    #[arg(long, env = "REVERIE_STORAGE_URL", global = true)]
    storage_url: Option<String>,

    /// Storage API key (overrides api_key)
    #[arg(long, env = "REVERIE_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Session token used to sign private recordings
    #[arg(long, env = "REVERIE_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a recording until it ends or Ctrl-C is pressed
    Play {
        #[command(flatten)]
        target: TargetArgs,

        /// Screen the request comes from
        #[arg(long, default_value = "feed")]
        context: PlaybackContext,

        /// Print card state as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the URL a recording would be played from
    Resolve {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Public URL, storage URL or bucket path of the recording
    pub audio_ref: String,

    /// Dream ID
    #[arg(long, default_value = "cli")]
    pub id: String,

    /// The recording is private
    #[arg(long)]
    pub private: bool,

    /// Owner of the recording (defaults to the viewer)
    #[arg(long)]
    pub owner: Option<String>,

    /// Signed-in user (overrides viewer_id in the config file)
    #[arg(long, env = "REVERIE_VIEWER")]
    pub viewer: Option<String>,

    /// Known length in seconds, shown before the file is opened
    #[arg(long)]
    pub duration: Option<u64>,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "reverie=debug,reverie_playback=debug,reverie_access=debug,reverie_audio=debug"
    } else {
        "reverie=info,reverie_playback=info,reverie_access=warn,reverie_audio=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting Reverie v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.storage_url {
        config.storage_url = url;
    }
    if let Some(key) = cli.api_key {
        config.api_key = key;
    }
    if cli.access_token.is_some() {
        config.access_token = cli.access_token;
    }

    match cli.command {
        Command::Play {
            target,
            context,
            json,
        } => commands::play(&config, &target, context, json).await,
        Command::Resolve { target } => commands::resolve(&config, &target)
            .await
            .map(|()| ExitCode::SUCCESS),
    }
}
