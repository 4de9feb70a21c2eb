use crate::{
    cli::globals::GlobalArgs,
    client::{parse_header_line, ApiRequest, AuthenticatedClient},
    navigation::TracingNavigator,
};
use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::Value;
use std::{
    io::{self, Write},
    sync::Arc,
};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub method: Method,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub data: Option<String>,
}

/// Builds the request descriptor. Bodies that parse as JSON are sent as JSON.
///
/// # Errors
/// Returns an error if a header is invalid.
pub fn build_request(args: &Args) -> Result<ApiRequest> {
    let mut request = ApiRequest::new(args.method.clone(), args.target.clone());

    if let Some(data) = &args.data {
        request = match serde_json::from_str::<Value>(data) {
            Ok(json) => request.json(&json)?,
            Err(_) => request.body(data.clone().into_bytes()),
        };
    }

    for (name, value) in &args.headers {
        request = request.header(name, value)?;
    }

    Ok(request)
}

/// Execute the fetch action: status line on stderr, body on stdout.
/// # Errors
/// Returns an error if the configuration is invalid or the request cannot be delivered.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.globals.client_config()?;
    let navigator = Arc::new(TracingNavigator::new("/"));
    let client = AuthenticatedClient::new(config, args.globals.store(), navigator.clone())
        .context("failed to build client")?;

    let request = build_request(&args)?;
    let response = client
        .authenticated_fetch(request)
        .await
        .with_context(|| format!("{} {} failed", args.method, args.target))?;

    let status = response.status();
    debug!("response status {}", status);

    let body = response.bytes().await.context("failed to read response body")?;

    eprintln!("{status}");
    if navigator.redirected() {
        eprintln!("session expired: run `authfetch session set` to sign in again");
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&body)?;
    if !body.ends_with(b"\n") && !body.is_empty() {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;

    Ok(())
}

/// Parses repeated `-H 'Name: value'` arguments.
///
/// # Errors
/// Returns an error on the first malformed header line.
pub(crate) fn parse_headers<'a>(
    lines: impl IntoIterator<Item = &'a String>,
) -> Result<Vec<(String, String)>> {
    lines
        .into_iter()
        .map(|line| parse_header_line(line).map_err(anyhow::Error::from))
        .collect()
}
