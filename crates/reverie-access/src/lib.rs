//! # reverie-access
//!
//! Turns stored audio references into playable URLs.
//!
//! Public audio passes straight through. Private audio gets a short-lived
//! signed URL from object storage, scoped to the item's owner and bounded by
//! a timeout. Signed URLs are never reused.

pub mod audio_ref;
pub mod resolver;
pub mod storage;

pub use audio_ref::{AudioRef, StoredObject};
pub use resolver::{AccessResolver, PlayableUrl};
pub use storage::{ObjectStorage, StorageClient};
