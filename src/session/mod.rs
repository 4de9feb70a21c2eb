//! Session persistence: a pluggable key-value store plus a typed facade over the
//! three fixed keys. Token values are held as `SecretString` and must never be
//! logged; only their presence is.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const AUTH_USER_KEY: &str = "authUser";

/// All keys owned by a session, cleared together on logout and teardown.
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, AUTH_USER_KEY];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Key-value persistence for session state.
///
/// An `update` must be applied atomically: readers see either all of its
/// writes and removals or none of them.
pub trait SessionStore: Send + Sync {
    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `set` and removes `remove` in one operation.
    ///
    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be written.
    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StoreError>;

    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(entries, &[])
    }

    /// # Errors
    /// Returns `StoreError` if the backing storage cannot be written.
    fn clear(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(&[], keys)
    }
}

/// Denormalized copy of the signed-in identity. A cache, not an authority.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed view over a [`SessionStore`].
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// Returns `StoreError` if the store cannot be read.
    pub fn access_token(&self) -> Result<Option<SecretString>, StoreError> {
        self.token(ACCESS_TOKEN_KEY)
    }

    /// # Errors
    /// Returns `StoreError` if the store cannot be read.
    pub fn refresh_token(&self) -> Result<Option<SecretString>, StoreError> {
        self.token(REFRESH_TOKEN_KEY)
    }

    /// Reads the user snapshot.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be read or the snapshot is not valid JSON.
    pub fn user(&self) -> Result<Option<AuthUser>, StoreError> {
        match self.store.get(AUTH_USER_KEY)? {
            Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Persists the credentials handed over by a login flow.
    ///
    /// # Errors
    /// Returns `StoreError` if the snapshot cannot be encoded or the store cannot be written.
    pub fn establish(
        &self,
        access_token: &SecretString,
        refresh_token: &SecretString,
        user: Option<&AuthUser>,
    ) -> Result<(), StoreError> {
        let snapshot = user.map(serde_json::to_string).transpose()?;

        let mut entries = vec![
            (ACCESS_TOKEN_KEY, access_token.expose_secret()),
            (REFRESH_TOKEN_KEY, refresh_token.expose_secret()),
        ];
        match snapshot.as_deref() {
            Some(snapshot) => {
                entries.push((AUTH_USER_KEY, snapshot));
                self.store.set(&entries)
            }
            None => self.store.update(&entries, &[AUTH_USER_KEY]),
        }
    }

    /// Overwrites the access token and, when the backend rotated it, the refresh token.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be written.
    pub fn store_tokens(
        &self,
        access_token: &SecretString,
        refresh_token: Option<&SecretString>,
    ) -> Result<(), StoreError> {
        let mut entries = vec![(ACCESS_TOKEN_KEY, access_token.expose_secret())];
        if let Some(refresh_token) = refresh_token {
            entries.push((REFRESH_TOKEN_KEY, refresh_token.expose_secret()));
        }
        self.store.set(&entries)
    }

    /// Clears tokens and the user snapshot.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(&SESSION_KEYS)
    }

    fn token(&self, key: &str) -> Result<Option<SecretString>, StoreError> {
        Ok(self
            .store
            .get(key)?
            .filter(|value| !value.trim().is_empty())
            .map(SecretString::from))
    }
}
