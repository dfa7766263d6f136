use std::path::PathBuf;

/// Result type for fatal monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Run-aborting errors. Per-candidate problems are never reported through
/// this type; they surface as [`crate::engine::RejectReason`] values.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("Index file not found: {}", path.display())]
    StoreMissing { path: PathBuf },

    #[error("Index file is empty or corrupted: {}", path.display())]
    StoreEmpty { path: PathBuf },

    #[error("Index content could not be parsed: {0}")]
    StoreCorrupt(String),

    #[error("Slot value cannot be written into the index: {0}")]
    InvalidSlotValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API Error: {0}")]
    Api(String),

    #[error("{context} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        context: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}
