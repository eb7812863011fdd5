use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's fatal [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run before or after the per-file loop.
///
/// Per-file read failures and per-unit service failures never surface here;
/// they are rendered inline in the report instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Configuration file does not exist.
    #[error("Configuration file not found at '{path}'. Run with --init-config to create one.")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file exists but could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`crate::Config`].
    #[error("Failed to parse configuration '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration values are out of range.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// No API key in the config file or the provider's environment variable.
    #[error("{provider} API key not found. Set llm.api_key in the config file or {env_var}.")]
    MissingCredential { provider: String, env_var: String },

    /// API key is still the template value.
    #[error("{provider} API key is still set to the placeholder '{value}'. Replace it with a real key.")]
    PlaceholderCredential { provider: String, value: String },

    /// Root path is missing or not a directory.
    #[error("Directory not found at '{path}'")]
    DirectoryNotFound { path: PathBuf },

    /// Directory walk failed at the root.
    #[error("Failed to walk '{path}': {message}")]
    Walk { path: PathBuf, message: String },

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Config template could not be written.
    #[error("Failed to write configuration to '{path}': {source}")]
    WriteConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report could not be written.
    #[error("Failed to write report to '{path}': {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON export failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound { path: path.into() }
    }

    /// Returns true for credential problems.
    #[must_use]
    pub const fn is_credential(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::PlaceholderCredential { .. }
        )
    }
}

/// Failure of a single call to the narrative service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("service returned an empty response")]
    EmptyResponse,

    #[error("{0} API key not provided")]
    MissingCredential(String),
}
