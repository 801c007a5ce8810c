use std::path::PathBuf;

use thiserror::Error;

/// Engine-wide result type alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types.
///
/// None of these are fatal to the engine: unreadable containers degrade to
/// empty children, a bad focus target leaves focus state untouched, and a
/// malformed search pattern falls back to literal substring matching.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A container's children could not be listed (e.g. concurrently deleted).
    #[error("source unavailable: {0}")]
    SourceUnavailable(PathBuf),

    /// A focus target did not resolve to a container in the hierarchy source.
    #[error("invalid focus target: {0}")]
    InvalidFocusTarget(PathBuf),

    /// A regex/glob search pattern failed to compile.
    #[error("malformed pattern: {0}")]
    MalformedPattern(String),

    /// A pane configuration file failed to parse.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O errors from the filesystem-backed source adapter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn source_unavailable_display() {
        let err = EngineError::SourceUnavailable(PathBuf::from("notes/inbox"));
        assert_eq!(err.to_string(), "source unavailable: notes/inbox");
    }

    #[test]
    fn invalid_focus_target_display() {
        let err = EngineError::InvalidFocusTarget(PathBuf::from("notes/a.md"));
        assert_eq!(err.to_string(), "invalid focus target: notes/a.md");
    }

    #[test]
    fn malformed_pattern_display() {
        let err = EngineError::MalformedPattern("[unclosed".into());
        assert_eq!(err.to_string(), "malformed pattern: [unclosed");
    }
}
