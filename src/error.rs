use thiserror::Error;

pub const URL_REQUIRED: &str = "URL is required and must be a string";
pub const URL_INVALID: &str = "Invalid URL format";
pub const CODE_REQUIRED: &str = "Short ID is required";

/// Failure reported by a `LinkStore` backend other than a key conflict.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    /// HTTP status the backend answered with, when it got that far.
    pub status: Option<u16>,
    pub message: String,
}

impl StoreError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Errors surfaced by link creation and resolution.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("could not allocate a unique short code after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LinkError {
    /// Status code the gateway response carries for this error.
    pub fn status(&self) -> u16 {
        match self {
            LinkError::InvalidInput(_) => 400,
            LinkError::Exhausted { .. } => 409,
            LinkError::Store(e) => e.status.filter(|s| *s >= 400).unwrap_or(500),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}
