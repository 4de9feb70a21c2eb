//! Client configuration for the backend API, the refresh exchange, and the
//! sign-in redirect. Values are public; do not store secrets here.

use crate::error::Error;
use std::time::Duration;
use url::Url;

/// Default path of the refresh-token exchange.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";
/// Default sign-in path used by session teardown.
pub const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";
/// Reason code attached to the sign-in redirect after an irrecoverable refresh failure.
pub const EXPIRED_REASON: &str = "expired";
/// Default bound on a single refresh exchange (seconds).
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub refresh_path: String,
    pub sign_in_path: String,
    pub expired_reason: String,
    pub refresh_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Builds a config for `base_url` with default paths and timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            expired_reason: EXPIRED_REASON.to_string(),
            refresh_timeout: Duration::from_secs(DEFAULT_REFRESH_TIMEOUT_SECS),
            user_agent: APP_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    #[must_use]
    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Checks that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    /// Returns `Error::Config` when the base URL is empty, unparseable, or not http(s).
    pub fn validate(&self) -> Result<(), Error> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(Error::Config("Base URL is not configured.".to_string()));
        }

        let url = Url::parse(base)
            .map_err(|err| Error::Config(format!("Invalid base URL {base}: {err}")))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(Error::Config(format!(
                "Invalid base URL {base}: unsupported scheme {scheme}"
            ))),
        }
    }

    /// Resolves a request target against the base URL. Absolute targets pass through.
    pub fn build_url(&self, target: &str) -> String {
        let target = target.trim();
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        build_url_with_base(&self.base_url, target)
    }

    /// Location the navigator is sent to on teardown, e.g. `/sign-in?reason=expired`.
    pub fn sign_in_target(&self) -> String {
        format!("{}?reason={}", self.sign_in_path, self.expired_reason)
    }
}

/// Joins a base URL and a path with exactly one slash between them.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
