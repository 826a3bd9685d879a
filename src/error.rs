//! Error types for the Bird Sort engine.
//!
//! Every failure the engine can report is a recoverable value. Move legality
//! problems are classified by [`IllegalMove`], search outcomes and bad input by
//! [`EngineError`], and configuration loading by [`ConfigError`].
use std::path::PathBuf;

/// Why a move was rejected by the move model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum IllegalMove {
    #[error("source branch is empty")]
    EmptySource,

    #[error("destination branch is full")]
    Full,

    #[error("destination top color does not match the source top color")]
    ColorMismatch,

    #[error("move would only relocate a sorted branch into an empty one")]
    NoOp,
}

/// Errors reported by the move model, the solver and the hint service.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("illegal move {from} -> {to}: {reason}")]
    IllegalMove {
        from: usize,
        to: usize,
        reason: IllegalMove,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("board cannot be solved by legal moves")]
    Unsolvable,

    #[error("search exhausted its budget after expanding {expanded} states")]
    SearchExhausted { expanded: usize },

    #[error("board is already solved")]
    AlreadySolved,
}

impl EngineError {
    /// Returns the move-level reason if this is an [`EngineError::IllegalMove`].
    pub fn illegal_reason(&self) -> Option<IllegalMove> {
        match self {
            EngineError::IllegalMove { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Invalid(#[from] EngineError),
}

/// Errors that can occur when loading a board from a text file.
#[derive(Debug, thiserror::Error)]
pub enum BoardFileError {
    #[error("failed to read board file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid board in {path}: {source}")]
    Parse { path: PathBuf, source: EngineError },
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_move_display() {
        let err = EngineError::IllegalMove {
            from: 2,
            to: 0,
            reason: IllegalMove::ColorMismatch,
        };
        assert_eq!(
            err.to_string(),
            "illegal move 2 -> 0: destination top color does not match the source top color"
        );
        assert_eq!(err.illegal_reason(), Some(IllegalMove::ColorMismatch));
    }

    #[test]
    fn test_search_exhausted_display() {
        let err = EngineError::SearchExhausted { expanded: 42 };
        assert_eq!(
            err.to_string(),
            "search exhausted its budget after expanding 42 states"
        );
        assert_eq!(err.illegal_reason(), None);
    }

    #[test]
    fn test_config_error_wraps_engine_error() {
        let err: ConfigError = EngineError::InvalidArgument("colors must be in 3..=8".into()).into();
        assert_eq!(
            err.to_string(),
            "config validation error: invalid argument: colors must be in 3..=8"
        );
    }
}
