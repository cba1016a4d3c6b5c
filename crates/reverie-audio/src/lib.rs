//! # reverie-audio
//!
//! Audio engine for Reverie: exactly one resource loaded at a time, driven
//! through a native [`MediaPlayer`] and observed through a status feed.
//!
//! Features:
//! - [`AudioEngine`] wrapper with bounded loads and fractional seeking
//! - [`HeadlessPlayer`], a clock-driven player that fetches and probes audio
//!   with symphonia

pub mod engine;
pub mod headless;
pub mod player;
pub mod probe;

pub use engine::AudioEngine;
pub use headless::HeadlessPlayer;
pub use player::MediaPlayer;
pub use probe::{probe_audio, ProbedAudio};
