use crate::cli::actions::{fetch, refresh, session, Action};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Fetch(args) => fetch::execute(args).await,
        Action::Refresh(args) => refresh::execute(args).await,
        Action::Session(args) => session::execute(args),
    }
}
