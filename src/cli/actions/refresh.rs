use crate::{cli::globals::GlobalArgs, client::AuthenticatedClient, navigation::TracingNavigator};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Execute the refresh action.
/// # Errors
/// Returns an error if the configuration is invalid or the exchange fails; a
/// failed exchange has already cleared the session.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.globals.client_config()?;
    let client = AuthenticatedClient::new(
        config,
        args.globals.store(),
        Arc::new(TracingNavigator::new("/")),
    )
    .context("failed to build client")?;

    if !client.force_refresh().await {
        bail!("token refresh failed, session cleared");
    }

    info!("access token refreshed");
    eprintln!("access token refreshed");

    Ok(())
}
