use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatioError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid divisor: {context} cannot be zero")]
    InvalidDivisor { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for RatioError {
    fn from(e: serde_json::Error) -> Self {
        RatioError::SerializationError(e.to_string())
    }
}
