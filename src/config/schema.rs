/// Configuration schema and defaults for sentiscope.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[ui]`, `[history]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level sentiscope configuration.
///
/// Maps directly to the `~/.sentiscope/config.toml` and `.sentiscope.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentiscopeConfig {
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the sentiment-analysis backend.
    pub base_url: String,
    /// Transport timeout for a single request (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [ui]
// ---------------------------------------------------------------------------

/// Timings for the interactive front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long a notification stays visible before it is dismissed.
    pub notification_ttl_ms: u64,
    /// Hard upper bound on how long the loading indicator stays up for a
    /// single request. The request is cancelled when it fires.
    pub loading_timeout_ms: u64,
    /// Delay between entering the analytics panel and refreshing it.
    pub analytics_refresh_ms: u64,
    /// Where the terminal renderer writes decoded word-cloud images.
    /// Defaults to `~/.sentiscope/wordcloud.png`.
    pub wordcloud_path: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notification_ttl_ms: 5_000,
            loading_timeout_ms: 30_000,
            analytics_refresh_ms: 100,
            wordcloud_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [history]
// ---------------------------------------------------------------------------

/// Recent-history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Persist history to disk. When false, history is kept in memory only.
    pub enabled: bool,
    /// Maximum number of entries retained (newest first).
    pub max_entries: usize,
    /// Number of characters of each analyzed text that are stored.
    pub prefix_chars: usize,
    /// History file location. Defaults to `~/.sentiscope/history.json`.
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 50,
            prefix_chars: 100,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Client event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append request lifecycle events to the client log.
    pub enabled: bool,
    /// Log file location. Defaults to `~/.sentiscope/client.log`.
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl SentiscopeConfig {
    /// The annotated config file written by `sentiscope config init`.
    pub fn default_toml() -> String {
        r#"# sentiscope configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (SENTISCOPE_*)
#   2. Project config (.sentiscope.toml in current directory)
#   3. User global config (~/.sentiscope/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:5001"
timeout_ms = 30000

[ui]
notification_ttl_ms = 5000            # Notifications auto-dismiss after this long
loading_timeout_ms = 30000            # Requests still running after this are cancelled
analytics_refresh_ms = 100            # Debounce before the analytics panel refreshes
# wordcloud_path = "/tmp/wordcloud.png"

[history]
enabled = true
max_entries = 50
prefix_chars = 100
# path = "/home/me/.sentiscope/history.json"

[logging]
enabled = true
# path = "/home/me/.sentiscope/client.log"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
