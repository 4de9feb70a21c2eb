//! # authfetch
//!
//! Authenticated HTTP requests against a backend API that issues short-lived
//! access tokens and longer-lived refresh tokens.
//!
//! ## Request Flow
//!
//! 1. **Attach:** The stored access token is sent as `Authorization: Bearer`.
//!    Without one the request goes out unauthenticated.
//! 2. **Refresh:** A `401` starts a single refresh exchange
//!    (`POST /auth/refresh-token`). Concurrent `401`s wait on that same exchange.
//! 3. **Retry:** After a successful refresh the request is reissued exactly once
//!    and whatever comes back is returned.
//! 4. **Teardown:** If the refresh fails the session keys are cleared, the
//!    navigator is sent to `/sign-in?reason=expired`, and the caller receives
//!    the original `401`.
//!
//! Session state lives behind [`session::SessionStore`] and navigation behind
//! [`navigation::Navigator`], both injected into [`AuthenticatedClient`].
//! Token values are never logged.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod navigation;
pub mod session;

pub use client::{ApiRequest, AuthenticatedClient};
pub use config::ClientConfig;
pub use error::Error;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
