//! Daemon configuration.
//!
//! Configuration is stored as TOML:
//! - Windows: `%APPDATA%/bloxpresence/config.toml`
//! - elsewhere: `~/.config/bloxpresence/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use bloxpresence_game_log::TailOptions;
use bloxpresence_presence::PresenceOptions;
use serde::{Deserialize, Serialize};

const MIN_POLL_INTERVAL_MS: u64 = 100;
const MAX_POLL_INTERVAL_MS: u64 = 10_000;

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory the client writes its logs to.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Replay the newest log from its start at launch.
    #[serde(default = "default_true")]
    pub read_from_start: bool,

    /// Log polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_true")]
    pub show_game_button: bool,

    #[serde(default = "default_true")]
    pub show_join_button: bool,
}

fn default_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let local =
            std::env::var("LOCALAPPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData\\Local".into());
        PathBuf::from(local).join("Roblox").join("logs")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("roblox")
            .join("logs")
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            read_from_start: default_true(),
            poll_interval_ms: default_poll_interval_ms(),
            show_game_button: default_true(),
            show_join_button: default_true(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    /// Loads configuration from a specific file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.poll_interval_ms = config
            .poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        Ok(config)
    }

    /// Saves the configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn tail_options(&self) -> TailOptions {
        TailOptions {
            from_start: self.read_from_start,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn presence_options(&self) -> PresenceOptions {
        PresenceOptions {
            show_game_button: self.show_game_button,
            show_join_button: self.show_join_button,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("bloxpresence")
            .join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("bloxpresence")
            .join("config.toml"))
    }
}
