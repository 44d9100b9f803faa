#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to write snapshot file: {0}")]
    SnapshotWrite(std::io::Error),
    #[error("failed to read snapshot file: {0}")]
    SnapshotRead(std::io::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize snapshot: {0}")]
    Deserialization(serde_json::Error),
}

impl From<ward_types::IntakeError> for WardError {
    fn from(err: ward_types::IntakeError) -> Self {
        WardError::Validation(err.to_string())
    }
}

pub type WardResult<T> = std::result::Result<T, WardError>;
