use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Directus instance, without trailing slash.
    pub directus_url: String,
    pub directus_token: String,
    pub bind_addr: String,
    /// Public origin of this site. Links to other hosts are treated as external.
    pub public_site_url: Option<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        let timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid REQUEST_TIMEOUT_SECS: {raw:?}"))?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            directus_url: get_env("DIRECTUS_URL")?.trim_end_matches('/').to_string(),
            directus_token: get_env("DIRECTUS_ADMIN_TOKEN")?,
            bind_addr: get_env_or_default("BIND_ADDR", DEFAULT_BIND_ADDR),
            public_site_url: env::var("PUBLIC_SITE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Config pointing at an arbitrary CMS location, used by tests.
    pub fn for_cms(directus_url: &str, directus_token: &str) -> Self {
        Config {
            directus_url: directus_url.trim_end_matches('/').to_string(),
            directus_token: directus_token.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            public_site_url: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn get_env(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("Missing required environment variable: {key}"))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[test]
fn test_for_cms_trims_trailing_slash() {
    let config = Config::for_cms("http://cms.local/", "token");
    assert_eq!(config.directus_url, "http://cms.local");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert!(config.public_site_url.is_none());
}
