use thiserror::Error;

/// Errors surfaced by the scan job engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("IP address is required")]
    MissingHost,

    #[error("Start port must be <= end port")]
    InvertedRange { start: i64, end: i64 },

    #[error("Port range must be 1-65535")]
    PortOutOfRange { start: i64, end: i64 },

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("Scan not found")]
    NotFound(String),

    #[error("scan registry is shutting down")]
    ShuttingDown,
}

impl ScanError {
    /// True for malformed or out-of-range scan requests (client errors).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScanError::MissingHost
                | ScanError::InvertedRange { .. }
                | ScanError::PortOutOfRange { .. }
                | ScanError::InvalidBody(_)
        )
    }
}
