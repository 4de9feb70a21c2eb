use crate::{
    cli::globals::GlobalArgs,
    session::{AuthUser, Session},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde_json::json;

#[derive(Debug)]
pub enum Command {
    Set {
        access_token: SecretString,
        refresh_token: SecretString,
        user: Option<AuthUser>,
    },
    Show,
    Clear,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Execute a session action against the session file.
/// # Errors
/// Returns an error if the session file cannot be read or written.
pub fn execute(args: Args) -> Result<()> {
    let session = args.globals.session();
    let path = args.globals.session_file.display().to_string();

    match args.command {
        Command::Set {
            access_token,
            refresh_token,
            user,
        } => {
            session
                .establish(&access_token, &refresh_token, user.as_ref())
                .with_context(|| format!("failed to write session to {path}"))?;
            eprintln!("session stored in {path}");
        }
        Command::Show => {
            let summary = summary(&session).with_context(|| format!("failed to read {path}"))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Clear => {
            session
                .clear()
                .with_context(|| format!("failed to clear session in {path}"))?;
            eprintln!("session cleared");
        }
    }

    Ok(())
}

/// Presence flags and the user snapshot; token values are never printed.
fn summary(session: &Session) -> Result<serde_json::Value> {
    Ok(json!({
        "accessToken": session.access_token()?.is_some(),
        "refreshToken": session.refresh_token()?.is_some(),
        "user": session.user()?,
    }))
}

/// Parses the `--user` JSON snapshot.
///
/// # Errors
/// Returns an error if the JSON does not describe a user.
pub fn parse_user(raw: &str) -> Result<AuthUser> {
    serde_json::from_str(raw).context("invalid --user JSON, expected at least id, email and role")
}
