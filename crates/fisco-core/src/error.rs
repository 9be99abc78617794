use thiserror::Error;

#[derive(Debug, Error)]
pub enum FiscoError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Could not build {kind} line: {reason}")]
    LineCreation { kind: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FiscoError {
    fn from(e: serde_json::Error) -> Self {
        FiscoError::SerializationError(e.to_string())
    }
}
