//! Configuration module for devscan.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.devscan/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DEVSCAN_` and use double
//! underscores to separate nested levels:
//! - `DEVSCAN_SCAN__MAX_CONCURRENCY=8` sets `scan.max_concurrency`
//! - `DEVSCAN_SYNC__PRUNE_MISSING=true` sets `sync.prune_missing`
//! - `DEVSCAN_WATCH__DEBOUNCE_MS=0` sets `watch.debounce_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = ".devscan";
pub const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "DEVSCAN_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace scanned when no path is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Where the JSON project registry lives
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Upper bound on directories classified at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SyncConfig {
    /// Delete registry entries directly under the workspace root whose
    /// directory is gone when a full scan runs. Off keeps full scans additive.
    #[serde(default)]
    pub prune_missing: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Watch the workspace after the initial sync
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Events deeper than this many levels below the root are ignored
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Quiet period before a newly created directory is classified
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Raw filesystem events buffered between notify and the worker
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Change notifications buffered per subscriber
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
}

/// Log levels: `default` for everything, `modules` for per-target overrides.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_store_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("projects.json")
}
fn default_true() -> bool {
    true
}
fn default_max_depth() -> usize {
    2
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_event_queue_capacity() -> usize {
    256
}
fn default_log_level() -> String {
    "warn".to_string()
}
pub(crate) fn default_max_concurrency() -> usize {
    num_cpus::get().max(4)
}
pub(crate) fn default_notify_capacity() -> usize {
    64
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            store_path: default_store_path(),
            scan: ScanConfig::default(),
            sync: SyncConfig::default(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: default_max_depth(),
            debounce_ms: default_debounce_ms(),
            event_queue_capacity: default_event_queue_capacity(),
            notify_capacity: default_notify_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

fn env_overrides() -> Env {
    // Double underscore separates nesting; single underscores stay in field names
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path).map(|mut settings| {
            if settings.workspace_root.is_none() {
                settings.workspace_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(env_overrides())
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by looking for a `.devscan` directory
    /// from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the directory that contains `.devscan`
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Workspace to operate on: explicit argument, then config, then cwd.
    pub fn resolve_workspace(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| self.workspace_root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `dir/.devscan`
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        settings.workspace_root = Some(std::fs::canonicalize(dir)?);
        settings.save(&config_path)?;

        Ok(config_path)
    }
}
