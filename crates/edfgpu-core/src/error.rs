//! Error types for edfgpu

use thiserror::Error;

/// Main error type for edfgpu
#[derive(Error, Debug)]
pub enum EdfGpuError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object or node not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency conflict on a conditional update
    #[error("Conflict updating {key}: expected version {expected}, found {actual}")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// Transport error talking to the object store
    #[error("Transport error: {0}")]
    Transport(String),

    /// Store call did not complete in time
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Plugin registry error
    #[error("Registry error: {0}")]
    Registry(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EdfGpuError {
    /// Whether the error is a version conflict worth re-reading for
    pub fn is_conflict(&self) -> bool {
        matches!(self, EdfGpuError::Conflict { .. })
    }
}

/// Result type for edfgpu operations
pub type EdfGpuResult<T> = Result<T, EdfGpuError>;

impl From<serde_json::Error> for EdfGpuError {
    fn from(err: serde_json::Error) -> Self {
        EdfGpuError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for EdfGpuError {
    fn from(err: toml::de::Error) -> Self {
        EdfGpuError::Config(format!("Failed to parse config: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EdfGpuError::Config("invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: invalid config");

        let err = EdfGpuError::Conflict {
            key: "default/train".to_string(),
            expected: 3,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "Conflict updating default/train: expected version 3, found 4"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EdfGpuError = io_err.into();
        assert!(matches!(err, EdfGpuError::Io(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_is_conflict() {
        let err = EdfGpuError::Conflict {
            key: "ns/a".to_string(),
            expected: 1,
            actual: 2,
        };
        assert!(err.is_conflict());
        assert!(!EdfGpuError::Transport("reset".to_string()).is_conflict());
    }
}
