//! Error types for Autocast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AutocastError>;

#[derive(Error, Debug)]
pub enum AutocastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Store(#[from] StoreError),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AutocastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AutocastError::InvalidInput(_) => 3,
            AutocastError::Config(_) => 2,
            AutocastError::Store(_) => 1,
            AutocastError::Generator(_) => 1,
            AutocastError::Platform(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access queue file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Queue file {path} is not a valid post array: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize queue: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Post not found in queue: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Missing API key: set {0}")]
    MissingApiKey(String),

    #[error("Request to generative API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generative API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not parse generative API output: {0}")]
    Malformed(String),

    #[error("Generative API returned no text")]
    Empty,
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {status} from {platform}")]
    UnexpectedStatus { platform: String, status: u16 },

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}
