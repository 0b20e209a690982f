/// Configuration system for sentiscope.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::SentiscopeConfig::default()`]
/// 2. **User global config** — `~/.sentiscope/config.toml`
/// 3. **Project local config** — `.sentiscope.toml` in the current working directory
/// 4. **Environment variables** — `SENTISCOPE_*` overrides (highest precedence)
///
/// File layers are merged key by key: a project file that only sets
/// `api.base_url` keeps every other value from the global file.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::SentiscopeConfig;

/// Directory holding config, history, and the client log.
const APP_DIR: &str = ".sentiscope";

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. A file that fails to parse, or holds a value of the wrong type, is
/// skipped on its own; the other layers still apply.
pub fn load() -> SentiscopeConfig {
    let layers = [global_config_path(), project_config_path()]
        .into_iter()
        .filter_map(load_toml_value);

    let mut config = merge_layers(layers);
    apply_env_overrides(&mut config);
    config
}

/// Load a TOML file as a raw value tree (if it exists and parses).
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge file layers in order over the defaults. Each layer must deserialize
/// into the schema by itself before it is merged.
fn merge_layers(layers: impl IntoIterator<Item = toml::Value>) -> SentiscopeConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for layer in layers {
        let checked: Result<SentiscopeConfig, _> = layer.clone().try_into();
        if checked.is_ok() {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Recursively merge `overlay` into `base`. Tables merge per key, any other
/// value in the overlay replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.sentiscope`, the home for every file the client writes.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR))
}

/// Path to the user global config: `~/.sentiscope/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

/// Path to the project local config: `.sentiscope.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".sentiscope.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

impl SentiscopeConfig {
    /// Resolved history file, or `None` when persistence is disabled or no
    /// home directory is available.
    pub fn history_path(&self) -> Option<PathBuf> {
        if !self.history.enabled {
            return None;
        }
        self.history
            .path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("history.json")))
    }

    /// Resolved client log file, or `None` when logging is disabled.
    pub fn log_path(&self) -> Option<PathBuf> {
        if !self.logging.enabled {
            return None;
        }
        self.logging
            .path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("client.log")))
    }

    /// Where decoded word-cloud images are written.
    pub fn wordcloud_path(&self) -> PathBuf {
        self.ui
            .wordcloud_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("wordcloud.png")))
            .unwrap_or_else(|| PathBuf::from("wordcloud.png"))
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `SENTISCOPE_API_URL` — backend base URL
/// - `SENTISCOPE_API_TIMEOUT_MS` — per-request transport timeout
/// - `SENTISCOPE_HISTORY` — history persistence (`1`/`true`/`yes`/`on`)
/// - `SENTISCOPE_LOG` — client event log (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut SentiscopeConfig) {
    if let Ok(val) = std::env::var("SENTISCOPE_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("SENTISCOPE_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("SENTISCOPE_HISTORY") {
        config.history.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("SENTISCOPE_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.sentiscope/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, SentiscopeConfig::default_toml()).context("failed to write config file")
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `api.base_url`. The existing value's type
/// decides how the raw string is parsed.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&SentiscopeConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer deserialize into the schema.
    let _: SentiscopeConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section_path, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be dotted, e.g. 'api.base_url': '{key}'");
    };

    let mut current = root;
    for part in section_path.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section_path}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn merge_values_keeps_unrelated_keys() {
        let mut base: toml::Value = toml::from_str(
            r#"
[api]
base_url = "http://global:5001"
timeout_ms = 1000
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[api]
base_url = "http://project:5001"

[history]
max_entries = 10
"#,
        )
        .unwrap();

        merge_values(&mut base, overlay);
        let config: SentiscopeConfig = base.try_into().unwrap();

        assert_eq!(config.api.base_url, "http://project:5001");
        assert_eq!(config.api.timeout_ms, 1000);
        assert_eq!(config.history.max_entries, 10);
        assert_eq!(config.history.prefix_chars, 100);
    }

    #[test]
    fn mistyped_layer_is_skipped_alone() {
        let global: toml::Value = toml::from_str(
            r#"
[api]
base_url = "http://global:9"

[ui]
notification_ttl_ms = 2000
"#,
        )
        .unwrap();
        let project: toml::Value = toml::from_str(
            r#"
[api]
base_url = "http://project:9"

[ui]
notification_ttl_ms = "soon"
"#,
        )
        .unwrap();

        let config = merge_layers([global, project]);

        assert_eq!(config.api.base_url, "http://global:9");
        assert_eq!(config.ui.notification_ttl_ms, 2000);
    }

    #[test]
    fn no_layers_gives_defaults() {
        let config = merge_layers(std::iter::empty());
        assert_eq!(config.api.base_url, SentiscopeConfig::default().api.base_url);
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str("[api]\nbase_url = \"a\"\n").unwrap();
        set_toml_value(&mut root, "api.base_url", "http://b:1").unwrap();
        assert_eq!(root["api"]["base_url"].as_str(), Some("http://b:1"));
    }

    #[test]
    fn set_toml_value_updates_bool_and_integer() {
        let mut root: toml::Value =
            toml::from_str("[history]\nenabled = true\nmax_entries = 50\n").unwrap();
        set_toml_value(&mut root, "history.enabled", "off").unwrap();
        set_toml_value(&mut root, "history.max_entries", "20").unwrap();
        assert_eq!(root["history"]["enabled"].as_bool(), Some(false));
        assert_eq!(root["history"]["max_entries"].as_integer(), Some(20));
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value = toml::from_str("[ui]\nloading_timeout_ms = 30000\n").unwrap();
        assert!(set_toml_value(&mut root, "ui.loading_timeout_ms", "soon").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_section_and_undotted_key() {
        let mut root: toml::Value = toml::from_str("[api]\nbase_url = \"a\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nope.key", "v").is_err());
        assert!(set_toml_value(&mut root, "base_url", "v").is_err());
    }

    #[test]
    fn set_config_value_at_creates_file_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value_at(&path, "ui.notification_ttl_ms", "2500").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let config: SentiscopeConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.ui.notification_ttl_ms, 2500);
        assert_eq!(config.history.max_entries, 50);
    }

    #[test]
    fn write_default_config_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        write_default_config(&path, true).unwrap();
    }

    #[test]
    fn disabled_history_has_no_path() {
        let mut config = SentiscopeConfig::default();
        config.history.enabled = false;
        assert!(config.history_path().is_none());

        config.history.enabled = true;
        config.history.path = Some(PathBuf::from("/tmp/h.json"));
        assert_eq!(config.history_path(), Some(PathBuf::from("/tmp/h.json")));
    }
}
