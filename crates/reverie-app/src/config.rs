//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the hosted backend project.
    pub storage_url: String,
    /// Bucket that bare audio paths live in.
    pub storage_bucket: String,
    /// Public API key sent with storage requests.
    pub api_key: String,
    /// Session token of the signed-in user, for signing private audio.
    pub access_token: Option<String>,
    /// ID of the signed-in user.
    pub viewer_id: Option<String>,
    pub resolve_timeout_secs: u64,
    pub signed_url_expiry_secs: u64,
    pub load_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_url: "http://localhost:54321".to_string(),
            storage_bucket: "dreams".to_string(),
            api_key: String::new(),
            access_token: None,
            viewer_id: None,
            resolve_timeout_secs: 10,
            signed_url_expiry_secs: 3600,
            load_timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the per-user config file is
    /// used when present, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        anyhow::ensure!(
            config.resolve_timeout_secs > 0 && config.load_timeout_secs > 0,
            "timeouts must be greater than zero"
        );
        anyhow::ensure!(
            config.signed_url_expiry_secs >= 60,
            "signed_url_expiry_secs must be at least 60"
        );
        Ok(config)
    }

    pub const fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub const fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    pub const fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

/// `<config dir>/reverie/config.toml`
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "reverie").map(|d| d.config_dir().join("config.toml"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            storage_url = "https://abc.supabase.co"
            viewer_id = "alice"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage_url, "https://abc.supabase.co");
        assert_eq!(config.viewer_id.as_deref(), Some("alice"));
        assert_eq!(config.storage_bucket, "dreams");
        assert_eq!(config.resolve_timeout(), Duration::from_secs(10));
        assert_eq!(config.signed_url_expiry(), Duration::from_secs(3600));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(AppConfig::from_toml_str("load_timeout_secs = 0").is_err());
        assert!(AppConfig::from_toml_str("signed_url_expiry_secs = 5").is_err());
    }

    #[test]
    fn test_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage_bucket = \"voice-notes\"").unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.storage_bucket, "voice-notes");

        assert!(AppConfig::load(Some(Path::new("/nonexistent/reverie.toml"))).is_err());
    }
}
