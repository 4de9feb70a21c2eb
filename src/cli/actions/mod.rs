pub mod fetch;
pub mod refresh;
pub mod session;

// Single dispatch point for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Fetch(fetch::Args),
    Refresh(refresh::Args),
    Session(session::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
