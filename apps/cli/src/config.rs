//! CLI configuration.
//!
//! User config lives at `~/.lumen/lumen.toml`. Resolution order for the
//! connection: CLI flags override environment variables, which override
//! config file values, which override defaults. The API key itself is never
//! stored in the file — only the name of the env var that holds it.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lumen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lumen";

/// Env var overriding the host, checked before the config file.
const HOST_ENV: &str = "LUMEN_HOST";

// ---------------------------------------------------------------------------
// Config structs (matching lumen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level CLI config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct AppConfig {
    /// Connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Command defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[connection]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ConnectionConfig {
    /// Base URL of the Lumen server.
    #[serde(default = "default_host")]
    pub host: String,

    /// Name of the env var holding the API key (never the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:7700".into()
}
fn default_api_key_env() -> String {
    "LUMEN_API_KEY".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DefaultsConfig {
    /// Default `--limit` for search and document listing.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// How long `documents add` waits for the update to process, in seconds.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

fn default_search_limit() -> usize {
    20
}
fn default_wait_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lumen/`).
pub(crate) fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| eyre!("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lumen/lumen.toml`).
pub(crate) fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the CLI config from disk. Returns defaults if the file does not exist.
pub(crate) fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the CLI config from a specific file path.
pub(crate) fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre!("cannot read {}: {e}", path.display()))?;

    toml::from_str(&content).map_err(|e| eyre!("failed to parse {}: {e}", path.display()))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub(crate) fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| eyre!("cannot create {}: {e}", dir.display()))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)?;

    std::fs::write(&path, content).map_err(|e| eyre!("cannot write {}: {e}", path.display()))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Connection resolution
// ---------------------------------------------------------------------------

/// Resolve the host: `--host` flag, then `LUMEN_HOST`, then the config file.
pub(crate) fn resolve_host(flag: Option<&str>, config: &AppConfig) -> String {
    if let Some(host) = flag {
        return host.to_string();
    }
    if let Ok(host) = std::env::var(HOST_ENV) {
        if !host.is_empty() {
            return host;
        }
    }
    config.connection.host.clone()
}

/// Resolve the API key: `--api-key` flag, then the env var named in the
/// config. `None` means an unsecured instance.
pub(crate) fn resolve_api_key(flag: Option<&str>, config: &AppConfig) -> Option<String> {
    if let Some(key) = flag {
        return Some(key.to_string());
    }
    match std::env::var(&config.connection.api_key_env) {
        Ok(key) if !key.is_empty() => Some(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("http://localhost:7700"));
        assert!(toml_str.contains("LUMEN_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.search_limit, 20);
        assert_eq!(parsed.connection.api_key_env, "LUMEN_API_KEY");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lumen.toml");
        std::fs::write(
            &path,
            r#"
[connection]
host = "https://search.internal:7700"
"#,
        )
        .expect("write config");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.connection.host, "https://search.internal:7700");
        assert_eq!(config.connection.api_key_env, "LUMEN_API_KEY");
        assert_eq!(config.defaults.search_limit, 20);
    }

    #[test]
    fn flag_beats_config_host() {
        let config = AppConfig::default();
        let host = resolve_host(Some("http://other:7700"), &config);
        assert_eq!(host, "http://other:7700");
    }

    #[test]
    fn api_key_resolution_prefers_flag() {
        let mut config = AppConfig::default();
        // Unique env var name to avoid interfering with other tests.
        config.connection.api_key_env = "LUMEN_TEST_NONEXISTENT_KEY_9313".into();

        assert_eq!(
            resolve_api_key(Some("fromFlag"), &config).as_deref(),
            Some("fromFlag")
        );
        assert_eq!(resolve_api_key(None, &config), None);
    }
}
