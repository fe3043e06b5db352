//! Maps validated CLI matches to the action the binary executes.

use crate::cli::{
    actions::{server::Args, Action},
    commands::{self, database, site},
};
use anyhow::{Context, Result};
use clap::parser::ValueSource;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let environment = matches
        .get_one::<String>(commands::ARG_ENVIRONMENT)
        .cloned()
        .unwrap_or_else(|| "production".to_string());
    let body_limit_mb = matches
        .get_one::<u64>(commands::ARG_BODY_LIMIT_MB)
        .copied()
        .unwrap_or(200);
    let body_limit = usize::try_from(body_limit_mb)
        .ok()
        .and_then(|mb| mb.checked_mul(1024 * 1024))
        .context("invalid --body-limit-mb")?;

    let database = database::Options::parse(matches)?;
    let site = site::Options::parse(matches)?;

    // Left at its default, the site reads from this same process.
    let api_upstream = if matches.value_source(site::ARG_API_UPSTREAM)
        == Some(ValueSource::DefaultValue)
    {
        format!("http://127.0.0.1:{port}/api")
    } else {
        site.api_upstream
    };
    let public_api_url = if matches.value_source(site::ARG_PUBLIC_API_URL).is_some() {
        site.public_api_url
    } else {
        api_upstream.clone()
    };

    Ok(Action::Server(Args {
        port,
        dsn: database.dsn,
        max_connections: database.max_connections,
        development: environment == "development",
        environment,
        body_limit,
        api_upstream,
        public_api_url,
        frontend_url: site.frontend_url,
        upstream_timeout: site.timeout,
    }))
}
