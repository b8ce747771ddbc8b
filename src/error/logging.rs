use std::io;

use thiserror::Error;

/// Ошибки инициализации подсистемы логирования.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("invalid filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    #[error("log directory error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to install global subscriber: {0}")]
    Init(String),
}
