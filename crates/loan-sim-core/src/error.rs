use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanSimError {
    #[error("Invalid parameter: {field} — {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanSimError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanSimError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        LoanSimError::NumericOverflow(format!("{context} exceeds decimal range"))
    }
}

impl From<serde_json::Error> for LoanSimError {
    fn from(e: serde_json::Error) -> Self {
        LoanSimError::SerializationError(e.to_string())
    }
}
