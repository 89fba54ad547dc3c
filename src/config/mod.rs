// ABOUTME: Configuration types and layered loading for reimage.
// ABOUTME: Defaults, then reimage.yml, then REIMAGE_* env vars, then CLI flags.

use crate::error::{Error, Result};
use crate::runtime::RuntimeConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "reimage.yml";
pub const CONFIG_FILENAME_ALT: &str = "reimage.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".reimage/config.yml";

pub const DEFAULT_BACKUP_DIR: &str = "/tmp/docker-backups";

pub const ENV_BACKUP_DIR: &str = "REIMAGE_BACKUP_DIR";
pub const ENV_SOCKET: &str = "REIMAGE_SOCKET";

/// The on-disk configuration file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    #[serde(default)]
    pub timeouts: Timeouts,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Upper bounds for engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    /// Any single non-pull engine call.
    #[serde(default = "default_operation_timeout", with = "humantime_serde")]
    pub operation: Duration,

    /// A full image pull.
    #[serde(default = "default_pull_timeout", with = "humantime_serde")]
    pub pull: Duration,

    /// Grace period given to a container before it is killed.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop: Duration,
}

fn default_operation_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_pull_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            operation: default_operation_timeout(),
            pull: default_pull_timeout(),
            stop: default_stop_timeout(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find the first config file in `dir`, then in the user config dir.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let mut candidates = vec![
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];
        if let Some(user_dir) = user_config_dir() {
            candidates.push(user_dir.join("reimage").join("config.yml"));
        }

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load(path).map(Some);
            }
        }

        Ok(None)
    }
}

fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backup_dir: PathBuf,
    pub timeouts: Timeouts,
    pub runtime: RuntimeConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            timeouts: Timeouts::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--config`: must exist when given.
    pub config_path: Option<PathBuf>,
    /// `--backup-dir`
    pub backup_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings, searching `cwd` for a config file unless one is given.
    pub fn resolve(cwd: &Path, overrides: &Overrides) -> Result<Self> {
        let file = match &overrides.config_path {
            Some(path) => Some(Config::load(path)?),
            None => Config::discover(cwd)?,
        };

        let mut settings = Settings::default();
        if let Some(file) = file {
            settings.apply_file(file);
        }
        settings.apply_env();
        if let Some(dir) = &overrides.backup_dir {
            settings.backup_dir = dir.clone();
        }
        Ok(settings)
    }

    fn apply_file(&mut self, file: Config) {
        if let Some(dir) = file.backup_dir {
            self.backup_dir = dir;
        }
        self.timeouts = file.timeouts;
        self.runtime = file.runtime;
    }

    fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(ENV_BACKUP_DIR).filter(|v| !v.is_empty()) {
            self.backup_dir = PathBuf::from(dir);
        }
        if let Ok(socket) = std::env::var(ENV_SOCKET)
            && !socket.is_empty()
        {
            self.runtime.socket = Some(socket);
        }
    }
}
