use thiserror::Error;

#[derive(Error, Debug)]
pub enum MboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid mbox format: {0}")]
    InvalidFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MboxError {
    /// True for the fatal "archive does not start with a separator" condition.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, MboxError::InvalidFormat(_))
    }
}

pub type Result<T> = std::result::Result<T, MboxError>;
