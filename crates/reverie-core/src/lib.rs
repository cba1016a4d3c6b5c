//! # reverie-core
//!
//! Core types and error handling shared by the Reverie playback crates.

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, HttpError, Result};
pub use types::*;
