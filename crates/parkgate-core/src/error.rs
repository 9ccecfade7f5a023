use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid badge identifier: {0}")]
    InvalidBadgeId(String),

    #[error("Invalid slot number {number}: facility has {capacity} slots")]
    InvalidSlot { number: usize, capacity: usize },

    // Parameter errors
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid value {value} for {name}: expected {min}..={max}")]
    InvalidParameterValue {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
