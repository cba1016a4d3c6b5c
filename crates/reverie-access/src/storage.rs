//! Object storage access.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reverie_core::{Error, HttpError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::audio_ref::StoredObject;

/// Default timeout for storage requests. The resolver applies its own,
/// usually tighter, bound on top of this.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Object storage able to hand out URLs for stored objects.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create a URL granting read access to `object` for `expiry`.
    async fn create_signed_url(&self, object: &StoredObject, expiry: Duration) -> Result<String>;

    /// URL of an object in a public bucket.
    fn public_url(&self, object: &StoredObject) -> Result<String>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// HTTP client for a Supabase-style storage API.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    /// `<project>/storage/v1/`
    base: Url,
}

impl StorageClient {
    /// Create a client for the storage API of the project at `project_url`.
    ///
    /// `api_key` is sent as the `apikey` header; `access_token` (the signed-in
    /// user's session token) authorises signing of private objects.
    pub fn new(project_url: &str, api_key: &str, access_token: Option<&str>) -> Result<Self> {
        let mut base = Url::parse(project_url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let base = base.join("storage/v1/")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        let bearer = access_token.unwrap_or(api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {bearer}"))
                .map_err(|e| Error::Config(format!("Invalid access token: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http, base })
    }

    fn object_url(&self, kind: &str, object: &StoredObject) -> Result<Url> {
        Ok(self
            .base
            .join(&format!("object/{kind}/{}/{}", object.bucket, object.path))?)
    }
}

#[async_trait]
impl ObjectStorage for StorageClient {
    async fn create_signed_url(&self, object: &StoredObject, expiry: Duration) -> Result<String> {
        let url = self.object_url("sign", object)?;
        debug!("Requesting signed URL for {object} ({}s)", expiry.as_secs());

        let response = self
            .http
            .post(url)
            .json(&SignRequest {
                expires_in: expiry.as_secs(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Http(HttpError::Timeout)
                } else {
                    Error::Http(HttpError::ConnectionFailed(e.to_string()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Signing {object} failed with {status}: {message}");
            return Err(Error::Http(HttpError::StatusError {
                status: status.as_u16(),
                message,
            }));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("Malformed sign response: {e}")))?;

        // The API answers with a path relative to `storage/v1`.
        let signed = self
            .base
            .join(body.signed_url.trim_start_matches('/'))?;
        Ok(signed.into())
    }

    fn public_url(&self, object: &StoredObject) -> Result<String> {
        Ok(self.object_url("public", object)?.into())
    }
}
