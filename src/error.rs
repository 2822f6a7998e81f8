use thiserror::Error;

#[derive(Error, Debug)]
pub enum SsoError {
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// No cache entry carried a usable access token. The payload is the
    /// full scan trail, one line per inspected entry.
    #[error("No usable SSO session found\n{0}")]
    NoSessionFound(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] ini::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SsoError>;
