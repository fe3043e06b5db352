use clap::{Arg, ArgMatches, Command};
use std::time::Duration;
use url::Url;

pub const ARG_API_UPSTREAM: &str = "api-upstream";
pub const ARG_PUBLIC_API_URL: &str = "public-api-url";
pub const ARG_FRONTEND_URL: &str = "frontend-url";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout";

#[derive(Debug, Clone)]
pub struct Options {
    pub api_upstream: String,
    pub public_api_url: String,
    pub frontend_url: String,
    pub timeout: Duration,
}

fn http_url(matches: &ArgMatches, id: &str) -> anyhow::Result<Option<String>> {
    let Some(value) = matches
        .get_one::<String>(id)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
    else {
        return Ok(None);
    };

    let parsed = Url::parse(value).map_err(|e| anyhow::anyhow!("invalid --{id} '{value}': {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("invalid --{id} '{value}': expected an http(s) URL");
    }
    Ok(Some(value.trim_end_matches('/').to_string()))
}

impl Options {
    /// Parse site arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a URL is missing or not http(s).
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let api_upstream = http_url(matches, ARG_API_UPSTREAM)?
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_API_UPSTREAM}"))?;
        let public_api_url =
            http_url(matches, ARG_PUBLIC_API_URL)?.unwrap_or_else(|| api_upstream.clone());
        let frontend_url = http_url(matches, ARG_FRONTEND_URL)?
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_FRONTEND_URL}"))?;

        Ok(Self {
            api_upstream,
            public_api_url,
            frontend_url,
            timeout: Duration::from_secs(
                matches
                    .get_one::<u64>(ARG_UPSTREAM_TIMEOUT)
                    .copied()
                    .unwrap_or(15),
            ),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_UPSTREAM)
                .long(ARG_API_UPSTREAM)
                .help("Content API the rendered site reads from")
                .default_value("http://127.0.0.1:8080/api")
                .env("MINARA_API_UPSTREAM"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_API_URL)
                .long(ARG_PUBLIC_API_URL)
                .help("Content API URL as seen by browsers and crawlers (default: --api-upstream)")
                .env("MINARA_PUBLIC_API_URL"),
        )
        .arg(
            Arg::new(ARG_FRONTEND_URL)
                .long(ARG_FRONTEND_URL)
                .help("Front-end origin used for canonical links and share redirects")
                .default_value("https://minaramasjid.com")
                .env("MINARA_FRONTEND_URL"),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Timeout in seconds for each upstream request")
                .default_value("15")
                .env("MINARA_UPSTREAM_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
