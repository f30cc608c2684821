//! Error types for the library layer.

use std::fmt;

use crate::config::ConfigError;
use crate::mirror::MirrorError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding configuration, mirror, serialization, and input validation failures.
#[derive(Debug)]
pub enum ProfileError {
    /// An error from the underlying CRM proxy client.
    Api(bizprofile_api::Error),
    /// A seed file failed to load or validate.
    Config(ConfigError),
    /// The local profile mirror could not be read or written.
    Mirror(MirrorError),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
    /// The session was opened from the mirror and cannot reach the proxy.
    Offline,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Mirror(e) => write!(f, "Mirror error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Offline => write!(f, "Profile was opened offline; the CRM proxy is not used"),
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Mirror(e) => Some(e),
            Self::Serialization(e) => Some(e),
            Self::InvalidInput(_) | Self::Offline => None,
        }
    }
}

impl From<bizprofile_api::Error> for ProfileError {
    fn from(e: bizprofile_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<ConfigError> for ProfileError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<MirrorError> for ProfileError {
    fn from(e: MirrorError) -> Self {
        Self::Mirror(e)
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
