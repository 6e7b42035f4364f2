//! Service configuration, read once from the environment at startup

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LOGIN_URL: &str = "https://gopaywall.com/login.php";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Remote account used to fetch the member roster
#[derive(Clone)]
pub struct PlatformConfig {
    pub username: String,
    pub password: String,
    /// Full URL of the login form endpoint
    pub login_url: String,
    /// Base URL of the member site, without trailing slash
    pub base_url: String,
    /// Timeout applied to each outbound request
    pub fetch_timeout: Duration,
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_url", &self.login_url)
            .field("base_url", &self.base_url)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl PlatformConfig {
    pub fn export_url(&self) -> String {
        format!("{}/exportusers.php", self.base_url)
    }

    pub fn custom_fields_url(&self) -> String {
        format!("{}/index.php?do=fields", self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub platform: PlatformConfig,
    pub bind_addr: SocketAddr,
    /// JSON file served for `test` requests instead of the built-in fixture
    pub fixture_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("{key} must be set"))
        };

        let username = required("GOPAYWALL_USER")?;
        let password = required("GOPAYWALL_PASS")?;
        let host = required("GOPAYWALL_HOST")?;

        let login_url = lookup("GOPAYWALL_LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
        let base_url = lookup("GOPAYWALL_BASE_URL")
            .unwrap_or_else(|| format!("https://{host}.gopaywall.com"))
            .trim_end_matches('/')
            .to_string();

        let fetch_timeout_secs: u64 = match lookup("FETCH_TIMEOUT_SECS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("FETCH_TIMEOUT_SECS is not a number: {value}"))?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let bind_addr: SocketAddr = match lookup("BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {addr}"))?,
            None => {
                let port: u16 = match lookup("PORT") {
                    Some(value) => value
                        .parse()
                        .with_context(|| format!("PORT is not a port number: {value}"))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        Ok(Self {
            platform: PlatformConfig {
                username,
                password,
                login_url,
                base_url,
                fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            },
            bind_addr,
            fixture_path: lookup("FIXTURE_PATH").map(PathBuf::from),
        })
    }
}
