//! Head index error types

use thiserror::Error;

/// Errors surfaced by the head index
#[derive(Error, Debug)]
pub enum HeadError {
    /// A lifecycle hook vetoed the creation of a new series.
    /// No series was inserted and no reference was consumed.
    #[error("series creation rejected: {0}")]
    AdmissionDenied(String),

    /// An admission policy refused a new series because the active
    /// series count is at its configured limit
    #[error("active series limit of {0} reached")]
    SeriesLimitReached(u64),

    /// Invalid head options
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure preparing the chunk directory root
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for head operations
pub type HeadResult<T> = Result<T, HeadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HeadError::AdmissionDenied("too many series".to_string());
        assert_eq!(err.to_string(), "series creation rejected: too many series");

        let err = HeadError::SeriesLimitReached(1000);
        assert_eq!(err.to_string(), "active series limit of 1000 reached");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let head_err: HeadError = io_err.into();
        assert!(matches!(head_err, HeadError::Io(_)));
    }
}
