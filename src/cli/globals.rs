use crate::{
    cli::commands::client::Options,
    config::ClientConfig,
    session::{FileStore, Session, SessionStore},
};
use anyhow::{anyhow, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub base_url: Option<String>,
    pub session_file: PathBuf,
    pub refresh_path: String,
    pub sign_in_path: String,
    pub refresh_timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            base_url: options.base_url,
            session_file: options.session_file,
            refresh_path: options.refresh_path,
            sign_in_path: options.sign_in_path,
            refresh_timeout: Duration::from_secs(options.refresh_timeout),
        }
    }

    /// # Errors
    /// Returns an error if no base URL was given.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("missing required argument: --base-url (or AUTHFETCH_BASE_URL)"))?;

        Ok(ClientConfig::new(base_url)
            .with_refresh_path(self.refresh_path.clone())
            .with_sign_in_path(self.sign_in_path.clone())
            .with_refresh_timeout(self.refresh_timeout))
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::new(FileStore::new(self.session_file.clone()))
    }

    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.store())
    }
}
