use std::{env, path::PathBuf};

use thiserror::Error;

use super::schema::Settings;

/// Shortest accepted progress poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// A setting that parsed but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidSetting {
    #[error("playback.poll_interval_ms must be at least 50, got {0}")]
    PollInterval(u64),
    #[error("library.extensions must name at least one extension")]
    NoExtensions,
    #[error("ui.columns must not be empty")]
    NoColumns,
}

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, lets environment variables
/// (prefix `SHELLAC__`) override it and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SHELLAC")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Reject settings the player cannot run with.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        let poll = self.playback.poll_interval_ms;
        if poll < MIN_POLL_INTERVAL_MS {
            return Err(InvalidSetting::PollInterval(poll));
        }
        if self.library.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(InvalidSetting::NoExtensions);
        }
        if self.ui.columns.is_empty() {
            return Err(InvalidSetting::NoColumns);
        }
        Ok(())
    }
}

/// Resolve the config path from `SHELLAC_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SHELLAC_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/shellac/config.toml`
/// or `~/.config/shellac/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("shellac").join("config.toml"))
}
