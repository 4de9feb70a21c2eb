//! Maps validated CLI arguments to an [`Action`].

use crate::cli::{
    actions::{fetch, refresh, session, Action},
    commands::{self, client},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use reqwest::Method;
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::new(client::Options::parse(matches)?);

    match matches.subcommand() {
        Some((commands::CMD_FETCH, sub_m)) => {
            let target = sub_m
                .get_one::<String>(commands::ARG_TARGET)
                .cloned()
                .context("missing required argument: <target>")?;

            let method = sub_m
                .get_one::<String>(commands::ARG_METHOD)
                .map_or("GET", String::as_str);
            let method = Method::from_bytes(method.trim().to_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method: {method}"))?;

            let headers = fetch::parse_headers(
                sub_m
                    .get_many::<String>(commands::ARG_HEADER)
                    .into_iter()
                    .flatten(),
            )?;

            Ok(Action::Fetch(fetch::Args {
                globals,
                method,
                target,
                headers,
                data: sub_m.get_one::<String>(commands::ARG_DATA).cloned(),
            }))
        }
        Some((commands::CMD_REFRESH, _)) => Ok(Action::Refresh(refresh::Args { globals })),
        Some((commands::CMD_SESSION, sub_m)) => {
            let command = match sub_m.subcommand() {
                Some((commands::CMD_SESSION_SET, set_m)) => session::Command::Set {
                    access_token: secret_arg(set_m, commands::ARG_ACCESS_TOKEN)?,
                    refresh_token: secret_arg(set_m, commands::ARG_REFRESH_TOKEN)?,
                    user: set_m
                        .get_one::<String>(commands::ARG_USER)
                        .map(|raw| session::parse_user(raw.as_str()))
                        .transpose()?,
                },
                Some((commands::CMD_SESSION_SHOW, _)) => session::Command::Show,
                Some((commands::CMD_SESSION_CLEAR, _)) => session::Command::Clear,
                _ => return Err(anyhow!("unknown session command")),
            };
            Ok(Action::Session(session::Args { globals, command }))
        }
        _ => Err(anyhow!("unknown command")),
    }
}

fn secret_arg(matches: &clap::ArgMatches, name: &str) -> Result<SecretString> {
    matches
        .get_one::<String>(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
        .with_context(|| format!("missing required argument: --{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn dispatch(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(
            [
                ("AUTHFETCH_BASE_URL", None::<&str>),
                ("AUTHFETCH_ACCESS_TOKEN", None::<&str>),
                ("AUTHFETCH_REFRESH_TOKEN", None::<&str>),
            ],
            || handler(&commands::new().get_matches_from(args)),
        )
    }

    #[test]
    fn test_fetch_action() {
        let action = dispatch(&[
            "authfetch",
            "-b",
            "https://api.example.test",
            "fetch",
            "/v1/plans",
            "-X",
            "delete",
            "-H",
            "Accept: application/json",
        ])
        .unwrap();

        let Action::Fetch(args) = action else {
            panic!("expected fetch action");
        };
        assert_eq!(args.method, Method::DELETE);
        assert_eq!(args.target, "/v1/plans");
        assert_eq!(
            args.headers,
            vec![("Accept".to_string(), "application/json".to_string())]
        );
        assert_eq!(
            args.globals.base_url.as_deref(),
            Some("https://api.example.test")
        );
    }

    #[test]
    fn test_fetch_rejects_bad_header() {
        let result = dispatch(&["authfetch", "fetch", "/v1/plans", "-H", "missing-colon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_set_action() {
        let action = dispatch(&[
            "authfetch",
            "session",
            "set",
            "--access-token",
            "access",
            "--refresh-token",
            "refresh",
            "--user",
            r#"{"id":"1","email":"ada@example.test","role":"admin"}"#,
        ])
        .unwrap();

        let Action::Session(session::Args {
            command:
                session::Command::Set {
                    access_token,
                    refresh_token,
                    user,
                },
            ..
        }) = action
        else {
            panic!("expected session set action");
        };
        assert_eq!(access_token.expose_secret(), "access");
        assert_eq!(refresh_token.expose_secret(), "refresh");
        assert_eq!(user.map(|u| u.role), Some("admin".to_string()));
    }

    #[test]
    fn test_session_set_rejects_bad_user() {
        let result = dispatch(&[
            "authfetch",
            "session",
            "set",
            "--access-token",
            "a",
            "--refresh-token",
            "r",
            "--user",
            "{nope",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_show_and_clear() {
        assert!(matches!(
            dispatch(&["authfetch", "session", "show"]).unwrap(),
            Action::Session(session::Args {
                command: session::Command::Show,
                ..
            })
        ));
        assert!(matches!(
            dispatch(&["authfetch", "session", "clear"]).unwrap(),
            Action::Session(session::Args {
                command: session::Command::Clear,
                ..
            })
        ));
    }

    #[test]
    fn test_refresh_action() {
        assert!(matches!(
            dispatch(&["authfetch", "refresh"]).unwrap(),
            Action::Refresh(_)
        ));
    }
}
