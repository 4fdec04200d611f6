use std::path::{Path, PathBuf};

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{KinoError, Result};

/// Application configuration (spec §6.1): layered from defaults, then the
/// YAML file, then `KINO_`-prefixed environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub player: PlayerConfig,
    pub preferences: PreferencesConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Plex,
    Jellyfin,
}

impl Default for ServerType {
    fn default() -> Self {
        ServerType::Plex
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub url: String,
    pub token: String,
    /// Jellyfin only.
    pub user_id: String,
    /// Jellyfin only, display purposes.
    pub username: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_type", &self.server_type)
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerConfig {
    pub command: String,
    pub args: Vec<String>,
    pub start_flag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    pub show_watch_status: bool,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self { show_watch_status: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: String,
    pub grid_columns: u32,
    pub default_view: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            grid_columns: 4,
            default_view: "grid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: String::new(), level: "INFO".to_string() }
    }
}

impl Config {
    /// Per-OS default config file path (spec §6.1).
    pub fn default_path() -> PathBuf {
        let base = if cfg!(target_os = "windows") {
            std::env::var_os("APPDATA").map(PathBuf::from).unwrap_or_else(|| dirs::config_dir().unwrap_or_default())
        } else {
            dirs::home_dir().unwrap_or_default().join(".config")
        };
        base.join("kino").join("config.yaml")
    }

    /// Loads defaults, then the YAML file at `path` if present, then
    /// `KINO_`-prefixed env overrides (`__` as the nesting delimiter). A
    /// missing file is not an error: it is populated with the serialized
    /// defaults so a later edit has something to start from, mirroring the
    /// `Config::load`/`save` round trip. A failure to write it back is
    /// logged, not propagated — running without a writable config dir is
    /// still usable in-memory.
    pub fn load(path: &Path) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if path.exists() {
            debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::new(path.to_string_lossy().as_ref(), FileFormat::Yaml));
        } else {
            info!(path = %path.display(), "no config file found, writing defaults");
            if let Err(err) = Config::default().save(path) {
                warn!(path = %path.display(), %err, "failed to write default config file");
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("KINO")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder
            .build()
            .map_err(|e| KinoError::Config(format!("failed to build config: {e}")))?;
        built
            .try_deserialize()
            .map_err(|e| KinoError::Config(format!("failed to parse config: {e}")))
    }

    /// Writes the current config back out as YAML, creating the parent
    /// directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KinoError::Config(format!("failed to create config dir: {e}")))?;
        }
        let yaml = serde_yaml::to_string(self).map_err(|e| KinoError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, yaml).map_err(|e| KinoError::Config(format!("failed to write config: {e}")))
    }

    /// `true` iff both `server.url` and `server.token` are non-empty
    /// (spec §6.1).
    pub fn is_configured(&self) -> bool {
        !self.server.url.is_empty() && !self.server.token.is_empty()
    }
}
