use crate::{
    config::ClientConfig,
    navigation::{location_path, Navigator},
    session::Session,
};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info};

/// Clears the session and sends the navigator to sign-in once.
///
/// The location check and the redirect run under `lock`, so concurrent
/// teardowns from a burst of failing requests produce a single navigation.
pub(crate) fn teardown(
    lock: &Mutex<()>,
    session: &Session,
    navigator: &dyn Navigator,
    config: &ClientConfig,
) {
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    if let Err(err) = session.clear() {
        error!("Failed to clear session: {}", err);
    }

    let current = navigator.current_location();
    if location_path(&current) == location_path(&config.sign_in_path) {
        debug!("already on sign-in, skipping redirect");
        return;
    }

    let target = config.sign_in_target();
    info!("session torn down, redirecting to {}", target);
    navigator.navigate(&target);
}
