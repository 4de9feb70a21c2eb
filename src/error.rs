use crate::session::StoreError;
use thiserror::Error;

/// Errors surfaced by [`crate::AuthenticatedClient`].
///
/// Access-token expiry is never reported here: callers only see the HTTP
/// response that resulted after at most one retry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidRequest(format!("Failed to parse URL: {err}"))
    }
}
