use thiserror::Error;

use super::{LoggingError, ParseError};

pub type HubResult<T> = Result<T, HubError>;

#[derive(Error, Debug)]
pub enum HubError {
    #[error("Topic parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}
