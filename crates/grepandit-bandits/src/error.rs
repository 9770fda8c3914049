use thiserror::Error;

#[derive(Debug, Error)]
pub enum BanditError {
    #[error("Snapshot deserialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Invalid epsilon {0}, expected a value in [0, 1]")]
    InvalidEpsilon(f64),
}

pub type Result<T> = std::result::Result<T, BanditError>;
