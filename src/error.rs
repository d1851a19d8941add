//! Error types for profile ranking and assignment.

use thiserror::Error;

/// Errors raised by the ranking engine, the assignment solver and the glue around them.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Input data is inconsistent with the model (shapes, ranges, names).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A setting is out of range or names something that does not exist.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested operation cannot run on the given input.
    #[error("Operation error: {0}")]
    Operation(String),

    /// A result was read before the computation producing it has run.
    #[error("State error: {0}")]
    State(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SelectionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_displays_correctly() {
        let err = SelectionError::validation("weights length 3 does not match 4 criteria");
        assert_eq!(
            err.to_string(),
            "Validation error: weights length 3 does not match 4 criteria"
        );
    }

    #[test]
    fn configuration_displays_correctly() {
        let err = SelectionError::configuration("unknown proximity formula 'fancy'");
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown proximity formula 'fancy'"
        );
    }

    #[test]
    fn state_displays_correctly() {
        let err = SelectionError::state("no assignment computed yet");
        assert_eq!(err.to_string(), "State error: no assignment computed yet");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json");
        let err: SelectionError = io.into();
        assert!(matches!(err, SelectionError::Io(_)));
    }
}
