//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the data folder
pub const ROOT_FOLDER_ENV: &str = "LEXQ_ROOT_FOLDER";

/// Environment variable pointing at an explicit config file
pub const CONFIG_FILE_ENV: &str = "LEXQ_CONFIG";

/// File name of the SQLite database inside the root folder
pub const DATABASE_FILE: &str = "lexquest.db";

/// Top-level configuration, read from `config.toml`
///
/// Every section is optional; missing values fall back to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LexqConfig {
    /// Data folder holding the local database
    pub root_folder: Option<PathBuf>,
    /// Vocabulary file (`source|target|example;...`); builtin list if unset
    pub catalog_path: Option<PathBuf>,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Local/remote synchronization timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period before a remote save fires (milliseconds)
    pub debounce_ms: u64,
    /// How often the engine checks whether the calendar day changed (seconds)
    pub rollover_check_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            rollover_check_secs: 60,
        }
    }
}

/// Remote profile store endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL; remote sync is disabled when unset
    pub base_url: Option<String>,
    /// Application namespace inside the remote store
    pub app_id: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            app_id: "lexquest".to_string(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "lexq_engine=info,lexq_common=info".to_string(),
        }
    }
}

impl LexqConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LexqConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with graceful degradation
    ///
    /// Lookup order: explicit path, `LEXQ_CONFIG`, platform config dir.
    /// A missing file yields defaults with a warning; a malformed file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var(CONFIG_FILE_ENV)
                .ok()
                .map(PathBuf::from)
                .or_else(|| default_config_path().ok()),
        };

        match path {
            Some(p) if p.exists() => {
                debug!("Loading config from {}", p.display());
                Self::load_from(&p)
            }
            Some(p) => {
                warn!("Config file not found at {}, using defaults", p.display());
                Ok(Self::default())
            }
            None => {
                warn!("No config file location available, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sync.debounce_ms == 0 {
            return Err(Error::Config("sync.debounce_ms must be positive".to_string()));
        }
        if self.sync.rollover_check_secs == 0 {
            return Err(Error::Config(
                "sync.rollover_check_secs must be positive".to_string(),
            ));
        }
        if self.remote.app_id.trim().is_empty() {
            return Err(Error::Config("remote.app_id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the data folder for this configuration
    pub fn resolve_root_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        resolve_root_folder(cli_arg, self.root_folder.as_deref())
    }

    /// Path of the SQLite database under the resolved root folder
    pub fn database_path(&self, cli_arg: Option<&Path>) -> PathBuf {
        self.resolve_root_folder(cli_arg).join(DATABASE_FILE)
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config_value: Option<&Path>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("lexquest").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/lexquest
        dirs::data_local_dir()
            .map(|d| d.join("lexquest"))
            .unwrap_or_else(|| PathBuf::from("./lexquest_data"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/lexquest
        dirs::data_dir()
            .map(|d| d.join("lexquest"))
            .unwrap_or_else(|| PathBuf::from("./lexquest_data"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\lexquest
        dirs::data_local_dir()
            .map(|d| d.join("lexquest"))
            .unwrap_or_else(|| PathBuf::from(".\\lexquest_data"))
    } else {
        PathBuf::from("./lexquest_data")
    }
}
