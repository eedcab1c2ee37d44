use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceivablesError {
    #[error("Invalid utilization amount {0}: must be greater than zero")]
    InvalidUtilizationAmount(f64),

    #[error("Utilization of {requested} exceeds available limit {available}")]
    UtilizationExceedsAvailable { requested: f64, available: f64 },

    #[error("No approved limit on record for clinic: {0}")]
    NoApprovedLimit(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReceivablesError>;
