//! Error types for the filter tree core

use thiserror::Error;

/// Main error type for the filter tree core
///
/// Tree mutations never fail with an error: addressing a missing node is a
/// no-op. These variants cover the fallible edges, i.e. decoding foreign JSON
/// into payloads, seeds and configuration.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<FilterError> for pyo3::PyErr {
    fn from(err: FilterError) -> pyo3::PyErr {
        use pyo3::exceptions::PyValueError;

        match err {
            FilterError::InvalidPayload(msg) => {
                PyValueError::new_err(format!("Invalid payload: {}", msg))
            }
            FilterError::InvalidOperand(msg) => {
                PyValueError::new_err(format!("Invalid operand: {}", msg))
            }
            FilterError::InvalidConfig(msg) => {
                PyValueError::new_err(format!("Invalid config: {}", msg))
            }
            FilterError::Deserialization(e) => {
                PyValueError::new_err(format!("Deserialization error: {}", e))
            }
        }
    }
}

/// Result type alias for the filter tree core
pub type Result<T> = std::result::Result<T, FilterError>;
