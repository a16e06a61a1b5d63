//! Application error types using thiserror
//!
//! Error hierarchy:
//! - RegistryError: Issues talking to an image registry (connect, list, auth, fetch, decode)
//! - ConfigError: Issues with CLI or config file settings

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Image registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to image registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Session or control-plane client could not be created
    #[error("failed to connect to {registry} registry: {message}")]
    Connection { registry: String, message: String },

    /// Repository enumeration failed part way through
    #[error("failed to list repositories in {registry} registry: {message}")]
    Listing { registry: String, message: String },

    /// The registry refused to issue an authorization token
    #[error("authorization token request to {registry} registry failed: {message}")]
    Auth { registry: String, message: String },

    /// Manifest retrieval failed for one image
    #[error("failed to fetch manifest for image '{image}': {message}")]
    Fetch {
        image: String,
        status: Option<u16>,
        message: String,
    },

    /// Manifest or embedded spec label could not be decoded
    #[error("failed to decode spec for image '{image}': {message}")]
    Decode { image: String, message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The selected registry kind needs a URL
    #[error("registry '{registry}' requires a registry URL (--url)")]
    MissingUrl { registry: String },

    /// Registry URL could not be parsed
    #[error("invalid registry URL '{value}': {message}")]
    InvalidUrl { value: String, message: String },

    /// A setting has an unusable value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Failed to read the config file
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the config file
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Registry kind exists but support was not compiled in
    #[error(
        "registry '{registry}' is not supported by this build (enable the '{feature}' feature)"
    )]
    UnsupportedRegistry { registry: String, feature: String },
}

impl RegistryError {
    /// Creates a new Connection error
    pub fn connection(registry: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Connection {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Listing error
    pub fn listing(registry: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Listing {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Auth error
    pub fn auth(registry: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Auth {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Fetch error
    pub fn fetch(
        image: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::Fetch {
            image: image.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a new Decode error
    pub fn decode(image: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Decode {
            image: image.into(),
            message: message.into(),
        }
    }

    /// Image this error relates to, if any
    pub fn image(&self) -> Option<&str> {
        match self {
            RegistryError::Fetch { image, .. } | RegistryError::Decode { image, .. } => {
                Some(image)
            }
            _ => None,
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::Connection { .. } => "connection",
            RegistryError::Listing { .. } => "listing",
            RegistryError::Auth { .. } => "auth",
            RegistryError::Fetch { .. } => "fetch",
            RegistryError::Decode { .. } => "decode",
        }
    }
}

impl ConfigError {
    /// Creates a new InvalidValue error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
