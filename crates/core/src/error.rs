//! Error types for the asymmetric LP system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the asymmetric LP system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid model or strategy input (balances, price, history).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Data error (invalid or missing bar data).
    #[error("Data error: {0}")]
    Data(String),

    /// A band that cannot be minted with the requested bounds.
    #[error("Degenerate band: {0}")]
    DegenerateBand(String),

    /// Token decimals lookup failed.
    #[error("Decimals lookup error: {0}")]
    Decimals(String),

    /// Inventory model name not present in the factory registry.
    #[error("Unknown inventory model '{name}'. Available: {}", available.join(", "))]
    UnknownModel {
        name: String,
        available: Vec<String>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a degenerate band error.
    pub fn degenerate_band(msg: impl Into<String>) -> Self {
        Error::DegenerateBand(msg.into())
    }

    /// Create a decimals lookup error.
    pub fn decimals(msg: impl Into<String>) -> Self {
        Error::Decimals(msg.into())
    }

    /// Create an unknown model error.
    pub fn unknown_model(name: impl Into<String>, available: Vec<String>) -> Self {
        Error::UnknownModel {
            name: name.into(),
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_lists_available() {
        let err = Error::unknown_model(
            "Nope",
            vec!["SimpleModel".to_string(), "GLFTModel".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("Nope"));
        assert!(msg.contains("SimpleModel, GLFTModel"));
    }
}
