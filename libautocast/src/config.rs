//! Configuration management for Autocast
//!
//! Settings live in a TOML file; credentials never do. Every secret is read
//! from the environment at the point of use, by the variable name the
//! config names.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

pub const CONFIG_ENV: &str = "AUTOCAST_CONFIG";
pub const QUEUE_PATH_ENV: &str = "AUTOCAST_QUEUE_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/autocast/queue.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    pub api_version: String,
    pub api_key_env: String,
    pub max_tokens: u32,
    pub ideas_per_week: usize,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
            api_version: "2023-06-01".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 2000,
            ideas_per_week: 7,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Seconds between wall-clock checks
    pub poll_interval: u64,
    /// Only post drafts whose platform matches the firing trigger
    pub filter_by_platform: bool,
    pub generation: WeeklyTriggerConfig,
    pub posting: Vec<DailyTriggerConfig>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            poll_interval: 60,
            filter_by_platform: false,
            generation: WeeklyTriggerConfig::default(),
            posting: vec![
                DailyTriggerConfig::new("09:00", "twitter"),
                DailyTriggerConfig::new("13:00", "linkedin"),
                DailyTriggerConfig::new("17:00", "twitter"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTriggerConfig {
    pub day: String,
    pub time: String,
}

impl Default for WeeklyTriggerConfig {
    fn default() -> Self {
        Self {
            day: "monday".to_string(),
            time: "09:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTriggerConfig {
    pub time: String,
    pub platform: String,
}

impl DailyTriggerConfig {
    pub fn new(time: &str, platform: &str) -> Self {
        Self {
            time: time.to_string(),
            platform: platform.to_string(),
        }
    }
}

/// Every platform is on unless its table says `enabled = false`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformsConfig {
    pub twitter: TwitterConfig,
    pub linkedin: LinkedInConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub token_env: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.twitter.com/2/tweets".to_string(),
            token_env: "TWITTER_BEARER_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub token_env: String,
    pub author_env: String,
}

impl Default for LinkedInConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.linkedin.com/rest/posts".to_string(),
            token_env: "LINKEDIN_ACCESS_TOKEN".to_string(),
            author_env: "LINKEDIN_AUTHOR_URN".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error: the defaults describe a working
    /// setup once the credential variables are exported.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        if let Ok(path) = std::env::var(QUEUE_PATH_ENV) {
            config.store.path = path;
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Queue file location with `~` and env vars expanded
    pub fn queue_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.store.path).map_err(|e| {
            ConfigError::InvalidValue {
                field: "store.path".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

/// Resolve the configuration file path (XDG config dir unless AUTOCAST_CONFIG is set)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("autocast").join("config.toml"))
}

/// Load a `.env` file from the working directory, if there is one
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
}

/// Read a credential from the environment; blank values count as unset
pub fn secret_from_env(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}
