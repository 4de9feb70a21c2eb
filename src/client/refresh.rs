//! Single-flight refresh of the access token.
//!
//! The first caller that needs a refresh spawns the exchange and parks a shared
//! handle to its outcome in the in-flight slot. Callers arriving while the slot
//! is occupied await that handle instead of starting their own exchange, so a
//! burst of 401s produces one exchange and every waiter sees the same outcome.
//! The spawned task empties the slot when it finishes.

use crate::{
    config::ClientConfig,
    session::{Session, StoreError},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info_span, Instrument};

#[derive(Clone, Debug)]
pub(crate) enum RefreshOutcome {
    Refreshed(SecretString),
    Failed,
}

#[derive(Debug, Error)]
pub(crate) enum RefreshError {
    #[error("no refresh token stored")]
    MissingRefreshToken,
    #[error("refresh request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("refresh rejected with status {0}")]
    Status(StatusCode),
    #[error("malformed refresh response: {0}")]
    Malformed(String),
    #[error("refresh timed out")]
    Timeout,
    #[error("failed to persist refreshed tokens: {0}")]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;
type Slot = Arc<Mutex<Option<InFlight>>>;

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    in_flight: Slot,
}

/// Empties the slot when the exchange task ends, including on panic or runtime shutdown.
struct ReleaseSlot(Slot);

impl Drop for ReleaseSlot {
    fn drop(&mut self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl RefreshCoordinator {
    /// Returns the in-flight exchange, or spawns `start()` and registers it.
    pub(crate) fn join_or_start<F, Fut>(&self, start: F) -> InFlight
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = slot.as_ref() {
            debug!("joining in-flight token refresh");
            return existing.clone();
        }

        let exchange = start();
        let release = ReleaseSlot(Arc::clone(&self.in_flight));
        let task = tokio::spawn(async move {
            let _release = release;
            exchange.await
        });

        let shared = async move {
            task.await.unwrap_or_else(|err| {
                error!("token refresh task failed: {}", err);
                RefreshOutcome::Failed
            })
        }
        .boxed()
        .shared();

        *slot = Some(shared.clone());
        shared
    }

    pub(crate) fn in_progress(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Runs one bounded refresh exchange and stores the result.
///
/// Stored credentials are only written after a well-formed success response.
pub(crate) async fn refresh_session(
    http: Client,
    config: ClientConfig,
    session: Session,
) -> Result<SecretString, RefreshError> {
    match timeout(config.refresh_timeout, exchange(&http, &config, &session)).await {
        Ok(result) => result,
        Err(_) => Err(RefreshError::Timeout),
    }
}

async fn exchange(
    http: &Client,
    config: &ClientConfig,
    session: &Session,
) -> Result<SecretString, RefreshError> {
    let refresh_token = session
        .refresh_token()?
        .ok_or(RefreshError::MissingRefreshToken)?;

    let refresh_url = config.build_url(&config.refresh_path);

    let span = info_span!(
        "auth.refresh_token",
        http.method = "POST",
        url = %refresh_url
    );
    let response = http
        .post(&refresh_url)
        .json(&RefreshRequest {
            refresh_token: refresh_token.expose_secret(),
        })
        .send()
        .instrument(span)
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RefreshError::Status(status));
    }

    let body = response.bytes().await?;
    let parsed: RefreshResponse = serde_json::from_slice(&body)
        .map_err(|err| RefreshError::Malformed(format!("Failed to decode response: {err}")))?;

    let access_token = parsed
        .access_token
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| RefreshError::Malformed("no accessToken found".to_string()))?;

    let rotated = parsed
        .refresh_token
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from);

    session.store_tokens(&access_token, rotated.as_ref())?;

    debug!(rotated = rotated.is_some(), "access token refreshed");

    Ok(access_token)
}
