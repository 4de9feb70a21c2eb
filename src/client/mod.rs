//! Authenticated requests against the backend API.
//!
//! Every request carries the stored access token as a bearer credential. A 401
//! triggers one shared refresh exchange; on success the request is reissued
//! once with the new token, on failure the session is torn down and the
//! original 401 is returned. Expiry is never reported as an error.

mod refresh;
pub mod request;
mod teardown;

pub use request::{parse_header_line, ApiRequest};

use crate::{
    config::ClientConfig,
    error::Error,
    navigation::Navigator,
    session::{Session, SessionStore},
};
use refresh::{refresh_session, RefreshCoordinator, RefreshOutcome};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info_span, instrument, warn, Instrument};
use url::Url;

struct Inner {
    http: Client,
    config: ClientConfig,
    session: Session,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
    teardown_lock: Mutex<()>,
}

/// Cheap to clone; clones share the session, navigator and in-flight refresh.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

impl AuthenticatedClient {
    /// # Errors
    /// Returns `Error::Config` if the config is invalid, or `Error::Transport` if
    /// the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let http = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self::with_http_client(http, config, store, navigator))
    }

    /// Uses a caller-built `reqwest::Client`, e.g. one with custom TLS roots.
    pub fn with_http_client(
        http: Client,
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                session: Session::new(store),
                navigator,
                refresh: RefreshCoordinator::default(),
                teardown_lock: Mutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Whether a refresh exchange is currently outstanding.
    #[must_use]
    pub fn refresh_in_progress(&self) -> bool {
        self.inner.refresh.in_progress()
    }

    /// Sends `request` with the stored access token, recovering once from expiry.
    ///
    /// # Errors
    /// Returns `Error::InvalidRequest` if the target does not resolve to a URL and
    /// `Error::Transport` if the request itself cannot be delivered.
    #[instrument(skip_all, fields(http.method = %request.method(), target = request.target()))]
    pub async fn authenticated_fetch(&self, request: ApiRequest) -> Result<Response, Error> {
        let token = match self.inner.session.access_token() {
            Ok(token) => token,
            Err(err) => {
                warn!("Failed to read access token, sending unauthenticated: {}", err);
                None
            }
        };

        let response = self.send(&request, token.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("access token rejected");

        if let Some(current) = self.rotated_since(token.as_ref()) {
            debug!("access token already refreshed, retrying");
            return self.send(&request, Some(&current)).await;
        }

        match self.refresh().await {
            RefreshOutcome::Refreshed(token) => {
                debug!("retrying with refreshed token");
                self.send(&request, Some(&token)).await
            }
            RefreshOutcome::Failed => {
                self.teardown();
                Ok(response)
            }
        }
    }

    /// # Errors
    /// See [`AuthenticatedClient::authenticated_fetch`].
    pub async fn get(&self, target: &str) -> Result<Response, Error> {
        self.authenticated_fetch(ApiRequest::get(target)).await
    }

    /// # Errors
    /// See [`AuthenticatedClient::authenticated_fetch`]; also fails if `body` cannot be encoded.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<Response, Error> {
        self.authenticated_fetch(ApiRequest::post(target).json(body)?)
            .await
    }

    /// # Errors
    /// See [`AuthenticatedClient::authenticated_fetch`].
    pub async fn delete(&self, target: &str) -> Result<Response, Error> {
        self.authenticated_fetch(ApiRequest::delete(target)).await
    }

    /// Runs the refresh protocol without a triggering request, joining an
    /// exchange already in flight. Tears the session down on failure.
    /// Returns whether a new access token was stored.
    pub async fn force_refresh(&self) -> bool {
        match self.refresh().await {
            RefreshOutcome::Refreshed(_) => true,
            RefreshOutcome::Failed => {
                self.teardown();
                false
            }
        }
    }

    /// Clears all session keys and redirects to sign-in unless already there.
    pub fn teardown(&self) {
        teardown::teardown(
            &self.inner.teardown_lock,
            &self.inner.session,
            self.inner.navigator.as_ref(),
            &self.inner.config,
        );
    }

    /// The stored access token, if it is no longer the one `sent` carried.
    /// Set when a refresh completed while this request was on the wire.
    fn rotated_since(&self, sent: Option<&SecretString>) -> Option<SecretString> {
        let stored = self.inner.session.access_token().ok().flatten()?;
        match sent {
            Some(sent) if sent.expose_secret() == stored.expose_secret() => None,
            _ => Some(stored),
        }
    }

    async fn refresh(&self) -> RefreshOutcome {
        let in_flight = self.inner.refresh.join_or_start(|| {
            let http = self.inner.http.clone();
            let config = self.inner.config.clone();
            let session = self.inner.session.clone();
            async move {
                match refresh_session(http, config, session).await {
                    Ok(token) => RefreshOutcome::Refreshed(token),
                    Err(err) => {
                        warn!("token refresh failed: {}", err);
                        RefreshOutcome::Failed
                    }
                }
            }
        });

        in_flight.await
    }

    async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<Response, Error> {
        let url = Url::parse(&self.inner.config.build_url(request.target()))?;

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url.clone())
            .headers(request.headers().clone());

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.to_vec());
        }

        let span = info_span!(
            "http.request",
            http.method = %request.method(),
            url = %url,
            authenticated = token.is_some()
        );

        Ok(builder.send().instrument(span).await?)
    }
}
