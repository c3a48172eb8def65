//! Error definitions for RMS

use thiserror::Error;

/// RMS error types
#[derive(Error, Debug)]
pub enum RmsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed coordinate: {0}")]
    MalformedCoordinate(String),

    #[error("Protocol decode error: {0}")]
    ProtocolDecode(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Buffer consistency error: expected {expected} entries, controller reports {actual}")]
    BufferConsistency { expected: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RmsError {
    pub fn decode(msg: impl Into<String>) -> Self {
        RmsError::ProtocolDecode(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        RmsError::MalformedCoordinate(msg.into())
    }
}

/// Result type alias for RMS operations
pub type RmsResult<T> = Result<T, RmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RmsError::Config("test".to_string());
        assert_eq!(format!("{}", err), "Configuration error: test");
    }

    #[test]
    fn test_buffer_consistency_display() {
        let err = RmsError::BufferConsistency { expected: 3, actual: 2 };
        assert_eq!(
            err.to_string(),
            "Buffer consistency error: expected 3 entries, controller reports 2"
        );
    }
}
