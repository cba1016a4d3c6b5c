//! Playable URL resolution.

use std::sync::Arc;
use std::time::Duration;

use reverie_core::{Error, HttpError, PlayableItem, Result};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::audio_ref::AudioRef;
use crate::storage::ObjectStorage;

/// Default bound on signed URL creation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a signed URL.
const DEFAULT_EXPIRY: Duration = Duration::from_secs(3600);

/// Default storage bucket for bare object paths.
pub const DEFAULT_BUCKET: &str = "dreams";

/// A URL the audio engine can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableUrl {
    pub url: String,
    /// When a signed URL stops working. `None` for public URLs.
    pub expires_at: Option<Instant>,
}

impl PlayableUrl {
    const fn public(url: String) -> Self {
        Self {
            url,
            expires_at: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub const fn is_signed(&self) -> bool {
        self.expires_at.is_some()
    }
}

/// Resolves playable items to URLs.
pub struct AccessResolver {
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
    timeout: Duration,
    expiry: Duration,
}

impl AccessResolver {
    /// Create a resolver backed by `storage`.
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            bucket: DEFAULT_BUCKET.to_string(),
            timeout: DEFAULT_TIMEOUT,
            expiry: DEFAULT_EXPIRY,
        }
    }

    /// Set the bucket bare object paths live in.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Set the bound on signed URL creation.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long signed URLs stay valid.
    pub const fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve `item` to a playable URL on behalf of `requester`.
    ///
    /// Public items resolve without contacting storage. Private items are
    /// only resolved for their owner, and every call requests a new signed
    /// URL valid for the full expiry window.
    pub async fn resolve(
        &self,
        item: &PlayableItem,
        requester: Option<&str>,
    ) -> Result<PlayableUrl> {
        let audio_ref = AudioRef::parse(&item.raw_audio_ref, &self.bucket).ok_or_else(|| {
            Error::LoadFailed(format!("Dream {} has no audio reference", item.id))
        })?;

        if !item.is_private {
            return match audio_ref {
                AudioRef::Remote(url) => Ok(PlayableUrl::public(url.into())),
                AudioRef::Stored(object) => {
                    self.storage.public_url(&object).map(PlayableUrl::public)
                }
            };
        }

        if !item.is_accessible_by(requester) {
            warn!("Denied private audio of {} to {:?}", item.id, requester);
            return Err(access_denied(item, requester));
        }

        let AudioRef::Stored(object) = audio_ref else {
            return Err(Error::LoadFailed(format!(
                "Private dream {} does not reference a stored object",
                item.id
            )));
        };

        let expires_at = Instant::now() + self.expiry;
        let signed = tokio::time::timeout(
            self.timeout,
            self.storage.create_signed_url(&object, self.expiry),
        )
        .await
        .map_err(|_| {
            warn!("Signing {object} exceeded {:?}", self.timeout);
            Error::Timeout(self.timeout)
        })?
        .map_err(|e| match e {
            Error::Http(HttpError::StatusError {
                status: 401 | 403, ..
            }) => access_denied(item, requester),
            Error::Http(HttpError::Timeout) => Error::Timeout(self.timeout),
            e @ (Error::AccessDenied { .. }
            | Error::Timeout(_)
            | Error::BackendUnavailable(_)) => e,
            other => Error::BackendUnavailable(other.to_string()),
        })?;

        info!("Signed URL issued for {object}");
        Ok(PlayableUrl {
            url: signed,
            expires_at: Some(expires_at),
        })
    }
}

fn access_denied(item: &PlayableItem, requester: Option<&str>) -> Error {
    Error::AccessDenied {
        item_id: item.id.clone(),
        requester: requester.unwrap_or("anonymous").to_string(),
    }
}
