pub mod client;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const CMD_FETCH: &str = "fetch";
pub const CMD_REFRESH: &str = "refresh";
pub const CMD_SESSION: &str = "session";
pub const CMD_SESSION_SET: &str = "set";
pub const CMD_SESSION_SHOW: &str = "show";
pub const CMD_SESSION_CLEAR: &str = "clear";

pub const ARG_TARGET: &str = "target";
pub const ARG_METHOD: &str = "method";
pub const ARG_HEADER: &str = "header";
pub const ARG_DATA: &str = "data";
pub const ARG_ACCESS_TOKEN: &str = "access-token";
pub const ARG_REFRESH_TOKEN: &str = "refresh-token";
pub const ARG_USER: &str = "user";

fn fetch_command() -> Command {
    Command::new(CMD_FETCH)
        .about("Send an authenticated request, refreshing the access token once if it expired")
        .arg(
            Arg::new(ARG_TARGET)
                .help("Path relative to the base URL, or an absolute URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_METHOD)
                .short('X')
                .long("request")
                .help("HTTP method")
                .default_value("GET"),
        )
        .arg(
            Arg::new(ARG_HEADER)
                .short('H')
                .long(ARG_HEADER)
                .help("Extra header, example: 'Accept: application/json'")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_DATA)
                .short('d')
                .long(ARG_DATA)
                .help("Request body, sent as JSON when it parses as JSON"),
        )
}

fn session_command() -> Command {
    Command::new(CMD_SESSION)
        .about("Manage the stored session")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_SESSION_SET)
                .about("Store credentials issued by a login")
                .arg(
                    Arg::new(ARG_ACCESS_TOKEN)
                        .long(ARG_ACCESS_TOKEN)
                        .help("Access token")
                        .env("AUTHFETCH_ACCESS_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_REFRESH_TOKEN)
                        .long(ARG_REFRESH_TOKEN)
                        .help("Refresh token")
                        .env("AUTHFETCH_REFRESH_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_USER)
                        .long(ARG_USER)
                        .help(r#"User snapshot as JSON, example: {"id":"1","email":"a@b.c","role":"user"}"#),
                ),
        )
        .subcommand(
            Command::new(CMD_SESSION_SHOW)
                .about("Show the user snapshot and which tokens are present"),
        )
        .subcommand(Command::new(CMD_SESSION_CLEAR).about("Clear tokens and user snapshot"))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authfetch")
        .about("Authenticated HTTP requests with token refresh")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(fetch_command())
        .subcommand(
            Command::new(CMD_REFRESH)
                .about("Exchange the refresh token for a new access token"),
        )
        .subcommand(session_command());

    let command = client::with_args(command);
    logging::with_args(command)
}
