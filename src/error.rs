use std::io;

use thiserror::Error;

pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{context} failed with status {status}. {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },
    #[error("{context}: none of the fields [{}] were present", .fields.join(", "))]
    MissingField {
        context: String,
        fields: &'static [&'static str],
    },
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("operation timed out")]
    Timeout,
}

impl From<reqwest::Error> for HarnessError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HarnessError::Timeout
        } else {
            HarnessError::Http(err)
        }
    }
}
