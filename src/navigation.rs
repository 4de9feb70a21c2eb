//! Navigation side-channel used by session teardown. Browsers redirect the
//! window; headless hosts record the location and log the redirect.

use std::sync::{Mutex, PoisonError};
use tracing::warn;

pub trait Navigator: Send + Sync {
    /// Current location, path plus optional query string.
    fn current_location(&self) -> String;

    fn navigate(&self, location: &str);
}

/// Returns the path component of a location, dropping query and fragment.
pub fn location_path(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    &location[..end]
}

/// Records every navigation in memory.
#[derive(Debug)]
pub struct MemoryNavigator {
    location: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(initial.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Locations navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, location: &str) {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location.to_string();
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(location.to_string());
    }
}

/// Navigator for command line use: the redirect becomes a warning telling the
/// operator to sign in again.
#[derive(Debug)]
pub struct TracingNavigator {
    inner: MemoryNavigator,
}

impl TracingNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: MemoryNavigator::new(initial),
        }
    }

    pub fn redirected(&self) -> bool {
        !self.inner.history().is_empty()
    }
}

impl Navigator for TracingNavigator {
    fn current_location(&self) -> String {
        self.inner.current_location()
    }

    fn navigate(&self, location: &str) {
        warn!("session expired, sign in again: {}", location);
        self.inner.navigate(location);
    }
}
