use crate::{
    api::{self, AppConfig, PoolConfig},
    cli::telemetry,
    site::SiteConfig,
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub max_connections: u32,
    pub environment: String,
    pub development: bool,
    /// Bytes.
    pub body_limit: usize,
    pub api_upstream: String,
    pub public_api_url: String,
    pub frontend_url: String,
    pub upstream_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let site = SiteConfig {
        api_upstream: args.api_upstream,
        public_api_url: args.public_api_url,
        frontend_url: args.frontend_url,
        timeout: args.upstream_timeout,
    };
    let config = AppConfig {
        development: args.development,
        body_limit: args.body_limit,
    };
    let pool = PoolConfig {
        max_connections: args.max_connections,
    };

    let result = api::new(args.port, &args.dsn, pool, &site, &config).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(args.dsn.expose_secret())),
        ("db_max_connections", args.max_connections.to_string()),
        ("environment", args.environment.clone()),
        ("body_limit_mb", (args.body_limit / (1024 * 1024)).to_string()),
        ("api_upstream", args.api_upstream.clone()),
        ("public_api_url", args.public_api_url.clone()),
        ("frontend_url", args.frontend_url.clone()),
        (
            "upstream_timeout",
            format!("{}s", args.upstream_timeout.as_secs()),
        ),
    ];
    log_entries("Startup configuration", &entries);
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", minara_banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn minara_banner() -> String {
    let short_hash = short_commit(crate::GIT_COMMIT_HASH);
    MINARA_BANNER.replace(
        "{VERSION}",
        &format!(" - {} - {}", env!("CARGO_PKG_VERSION"), short_hash),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    trimmed.chars().take(7).collect()
}

const MINARA_BANNER: &str = r"
      (
      |
     /_\
     | |
     | |
    _|_|_   M I N A R A {VERSION}
   |_____|
   |     |";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsn_passwords_are_redacted() {
        assert_eq!(
            redact_dsn("postgres://minara:secret@db:5432/minara"),
            "postgres://minara:REDACTED@db:5432/minara"
        );
        assert_eq!(
            redact_dsn("postgres://db:5432/minara"),
            "postgres://db:5432/minara"
        );
        assert_eq!(redact_dsn("::"), "invalid-dsn");
    }

    #[test]
    fn banner_carries_version_and_short_commit() {
        assert_eq!(short_commit(" 0123456789abcdef "), "0123456");
        assert_eq!(short_commit("abc"), "abc");

        let banner = minara_banner();
        assert!(banner.contains(env!("CARGO_PKG_VERSION")));
        assert!(!banner.contains("{VERSION}"));
    }
}
