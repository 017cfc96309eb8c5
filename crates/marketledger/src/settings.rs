//! Application settings persisted as JSON in the platform config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use marketledger_core::PollingConfig;
use serde::{Deserialize, Serialize};

/// Application settings that persist across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Root of the marketplace API, e.g. `https://market.example/api/`.
    pub api_base_url: String,
    /// Seconds between unread count polls.
    pub unread_poll_secs: u64,
    /// Seconds between polls of the open conversation.
    pub conversation_poll_secs: u64,
    /// Seconds before an HTTP request is abandoned.
    pub request_timeout_secs: u64,
    /// Show errors as desktop notifications instead of log lines.
    pub desktop_notifications: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/".to_string(),
            unread_poll_secs: 30,
            conversation_poll_secs: 5,
            request_timeout_secs: 30,
            desktop_notifications: true,
        }
    }
}

impl AppSettings {
    /// Polling intervals for the messaging engine.
    #[must_use]
    pub fn polling(&self) -> PollingConfig {
        PollingConfig::builder()
            .unread_interval(Duration::from_secs(self.unread_poll_secs))
            .conversation_interval(Duration::from_secs(self.conversation_poll_secs))
            .build()
    }

    /// Request timeout for the HTTP client.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Directory holding the settings file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketledger")
}

/// Directory holding the client state database.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marketledger")
}

/// Path of the client state database inside `data_dir`.
pub fn database_path(data_dir: &Path) -> anyhow::Result<String> {
    let path = data_dir.join("marketledger.db");
    path.to_str()
        .map(str::to_string)
        .with_context(|| format!("database path {} is not valid UTF-8", path.display()))
}

/// Load application settings from file, falling back to defaults.
pub async fn load_settings() -> anyhow::Result<AppSettings> {
    let settings_path = config_dir().join("settings.json");
    if !settings_path.exists() {
        return Ok(AppSettings::default());
    }

    let contents = tokio::fs::read_to_string(&settings_path)
        .await
        .with_context(|| format!("reading {}", settings_path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", settings_path.display()))
}

/// Save application settings to file.
pub async fn save_settings(settings: &AppSettings) -> anyhow::Result<()> {
    let dir = config_dir();
    tokio::fs::create_dir_all(&dir).await?;

    let settings_path = dir.join("settings.json");
    let contents = serde_json::to_string_pretty(settings)?;
    tokio::fs::write(&settings_path, contents).await?;

    tracing::info!("Settings saved to {:?}", settings_path);
    Ok(())
}
