//! # Store Configuration
//!
//! Where the snapshot files live and how damaged files are treated.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_DATA_DIR=/srv/stockroom                                  │
//! │     STOCKROOM_LOAD_POLICY=lenient                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir, LoadPolicy::Strict, pretty JSON                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockroom.toml
//! data_dir = "/srv/stockroom/data"
//! load_policy = "strict"   # strict | lenient
//! pretty = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Load Policy
// =============================================================================

/// What to do with a snapshot file that exists but cannot be parsed.
///
/// ```text
///                      missing / blank    unparseable
///  Strict (default)    empty              StoreError::Corrupt
///  Lenient             empty              empty + warn! log
/// ```
///
/// `Lenient` reproduces the behavior of stores that silently start over
/// from an empty collection. The next successful write then replaces the
/// damaged file, so pick it only when losing that file is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    #[default]
    Strict,
    Lenient,
}

impl std::fmt::Display for LoadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadPolicy::Strict => write!(f, "strict"),
            LoadPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

impl std::str::FromStr for LoadPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(LoadPolicy::Strict),
            "lenient" => Ok(LoadPolicy::Lenient),
            other => Err(StoreError::Config(format!(
                "Unknown load policy: '{}'. Valid options: strict, lenient",
                other
            ))),
        }
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Complete store configuration.
///
/// ## Example
/// ```rust
/// use stockroom_store::{LoadPolicy, StoreConfig};
///
/// let config = StoreConfig::new("./data").load_policy(LoadPolicy::Lenient);
/// assert_eq!(config.data_dir, std::path::PathBuf::from("./data"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<type>s.json` file per entity type.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Treatment of unparseable snapshot files.
    #[serde(default)]
    pub load_policy: LoadPolicy,

    /// Write indented JSON. Default: true
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "stockroom", "stockroom")
        .map(|dirs| dirs.data_dir().join("data"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_pretty() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: default_data_dir(),
            load_policy: LoadPolicy::default(),
            pretty: default_pretty(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at `data_dir` with default settings.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the load policy.
    pub fn load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    /// Sets whether snapshot files are indented.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockroom.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents =
                    std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| StoreError::io(&path, e))?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::Config("data_dir must not be empty".into()));
        }

        if self.data_dir.is_file() {
            return Err(StoreError::Config(format!(
                "data_dir {} is a file, expected a directory",
                self.data_dir.display()
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("STOCKROOM_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(policy) = lookup("STOCKROOM_LOAD_POLICY") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding load policy from environment");
                    self.load_policy = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown load policy in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_policy_parsing() {
        assert_eq!("strict".parse::<LoadPolicy>().unwrap(), LoadPolicy::Strict);
        assert_eq!("Lenient".parse::<LoadPolicy>().unwrap(), LoadPolicy::Lenient);
        assert!("forgiving".parse::<LoadPolicy>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.load_policy, LoadPolicy::Strict);
        assert!(config.pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOCKROOM_DATA_DIR", "/tmp/elsewhere"),
            ("STOCKROOM_LOAD_POLICY", "lenient"),
        ]
        .into_iter()
        .collect();

        let mut config = StoreConfig::new("./data");
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.load_policy, LoadPolicy::Lenient);
    }

    #[test]
    fn test_bad_env_policy_is_ignored() {
        let mut config = StoreConfig::new("./data");
        config.apply_overrides_from(|k| {
            (k == "STOCKROOM_LOAD_POLICY").then(|| "sometimes".to_string())
        });
        assert_eq!(config.load_policy, LoadPolicy::Strict);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stockroom.toml");

        let config = StoreConfig::new(dir.path().join("data")).load_policy(LoadPolicy::Lenient);
        config.save(Some(path.clone())).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("load_policy = \"lenient\""));

        let parsed: StoreConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.data_dir, dir.path().join("data"));
        assert_eq!(parsed.load_policy, LoadPolicy::Lenient);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StoreConfig = toml::from_str("load_policy = \"lenient\"").unwrap();
        assert!(parsed.pretty);
        assert_eq!(parsed.load_policy, LoadPolicy::Lenient);
    }

    #[test]
    fn test_data_dir_must_not_be_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = StoreConfig::new(file.path());
        assert!(matches!(config.validate(), Err(StoreError::Config(_))));
    }
}
