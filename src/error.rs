//! Error types and handling for `Tripcast`

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the `Tripcast` library
#[derive(Error, Debug)]
pub enum TripcastError {
    /// An external provider could not be reached or answered with garbage
    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable {
        provider: &'static str,
        message: String,
    },

    /// The routing provider found no route between the two locations
    #[error("No route found: {message}")]
    NoRouteFound { message: String },

    /// A location could not be resolved by a provider
    #[error("Invalid location: {message}")]
    InvalidLocation { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TripcastError {
    /// Create a new provider error
    pub fn provider<S: Into<String>>(provider: &'static str, message: S) -> Self {
        Self::ProviderUnavailable {
            provider,
            message: message.into(),
        }
    }

    /// Create a new no-route error
    pub fn no_route<S: Into<String>>(message: S) -> Self {
        Self::NoRouteFound {
            message: message.into(),
        }
    }

    /// Create a new invalid-location error
    pub fn invalid_location<S: Into<String>>(message: S) -> Self {
        Self::InvalidLocation {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Wrap a transport failure from an HTTP provider
    pub fn from_transport(provider: &'static str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::provider(provider, "request timed out")
        } else if err.is_decode() {
            Self::provider(provider, format!("malformed response: {err}"))
        } else {
            Self::provider(provider, err.to_string())
        }
    }

    /// Stable machine-readable error code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            TripcastError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            TripcastError::NoRouteFound { .. } => "NO_ROUTE_FOUND",
            TripcastError::InvalidLocation { .. } => "INVALID_LOCATION",
            TripcastError::Validation { .. } => "VALIDATION_ERROR",
            TripcastError::Config { .. } => "CONFIG_ERROR",
            TripcastError::Cache { .. } => "CACHE_ERROR",
            TripcastError::Io { .. } => "IO_ERROR",
        }
    }

    /// Status a boundary layer should report for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            TripcastError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            TripcastError::NoRouteFound { .. } | TripcastError::InvalidLocation { .. } => {
                StatusCode::NOT_FOUND
            }
            TripcastError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TripcastError::Config { .. } | TripcastError::Cache { .. } | TripcastError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripcastError::ProviderUnavailable { provider, .. } => {
                format!("The {provider} service is temporarily unavailable. Please try again later.")
            }
            TripcastError::NoRouteFound { .. } => {
                "No route could be found between the given locations.".to_string()
            }
            TripcastError::InvalidLocation { message } => {
                format!("Location could not be resolved: {message}")
            }
            TripcastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripcastError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripcastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            TripcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
