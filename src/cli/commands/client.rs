use crate::config::{DEFAULT_REFRESH_PATH, DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_SIGN_IN_PATH};
use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;

pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_REFRESH_PATH: &str = "refresh-path";
pub const ARG_SIGN_IN_PATH: &str = "sign-in-path";
pub const ARG_REFRESH_TIMEOUT: &str = "refresh-timeout";

pub const DEFAULT_SESSION_FILE: &str = "authfetch-session.json";
const DEFAULT_REFRESH_TIMEOUT: &str = "10";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BASE_URL)
                .short('b')
                .long(ARG_BASE_URL)
                .help("Backend API base URL, example: https://api.example.com")
                .env("AUTHFETCH_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .short('s')
                .long(ARG_SESSION_FILE)
                .help("JSON file holding the session tokens and user snapshot")
                .env("AUTHFETCH_SESSION_FILE")
                .default_value(DEFAULT_SESSION_FILE)
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_REFRESH_PATH)
                .long(ARG_REFRESH_PATH)
                .help("Path of the refresh-token exchange")
                .env("AUTHFETCH_REFRESH_PATH")
                .default_value(DEFAULT_REFRESH_PATH)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SIGN_IN_PATH)
                .long(ARG_SIGN_IN_PATH)
                .help("Sign-in location used when the session is torn down")
                .env("AUTHFETCH_SIGN_IN_PATH")
                .default_value(DEFAULT_SIGN_IN_PATH)
                .global(true),
        )
        .arg(
            Arg::new(ARG_REFRESH_TIMEOUT)
                .long(ARG_REFRESH_TIMEOUT)
                .help("Seconds to wait for the refresh exchange before giving up")
                .env("AUTHFETCH_REFRESH_TIMEOUT")
                .default_value(DEFAULT_REFRESH_TIMEOUT)
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub base_url: Option<String>,
    pub session_file: PathBuf,
    pub refresh_path: String,
    pub sign_in_path: String,
    pub refresh_timeout: u64,
}

impl Options {
    /// # Errors
    /// Returns an error if an argument carrying a default is somehow absent.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            base_url: matches
                .get_one::<String>(ARG_BASE_URL)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            session_file: matches
                .get_one::<PathBuf>(ARG_SESSION_FILE)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            refresh_path: matches
                .get_one::<String>(ARG_REFRESH_PATH)
                .cloned()
                .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string()),
            sign_in_path: matches
                .get_one::<String>(ARG_SIGN_IN_PATH)
                .cloned()
                .unwrap_or_else(|| DEFAULT_SIGN_IN_PATH.to_string()),
            refresh_timeout: matches
                .get_one::<u64>(ARG_REFRESH_TIMEOUT)
                .copied()
                .unwrap_or(DEFAULT_REFRESH_TIMEOUT_SECS),
        })
    }
}
