use thiserror::Error;

/// Error types for the nlls-rs library.
#[derive(Error, Debug)]
pub enum NllsError {
    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating an invalid solver configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error during function evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for nlls-rs operations.
pub type Result<T> = std::result::Result<T, NllsError>;

/// Extensions for converting from other error types.
impl From<String> for NllsError {
    fn from(s: String) -> Self {
        NllsError::Other(s)
    }
}

impl From<&str> for NllsError {
    fn from(s: &str) -> Self {
        NllsError::Other(s.to_string())
    }
}
