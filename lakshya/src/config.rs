use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Where and how the client talks to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint paths are appended to this, eg "http://localhost:8000/api" + "/users/me"
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        ClientConfig {
            base_url: normalize_base_url(base_url),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: APP_USER_AGENT.to_string(),
        }
    }

    /// Reads `LAKSHYA_API_URL` and `LAKSHYA_API_TIMEOUT_SECS`, falling back to a local
    /// development server.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("LAKSHYA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = ClientConfig::new(&base_url);
        if let Ok(secs) = std::env::var("LAKSHYA_API_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .context("LAKSHYA_API_TIMEOUT_SECS must be a whole number of seconds")?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::new(DEFAULT_API_URL)
    }
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

#[test]
fn test_normalize_base_url() {
    assert_eq!(
        ClientConfig::new("http://localhost:8000/api/").base_url,
        "http://localhost:8000/api"
    );
    assert_eq!(
        ClientConfig::new(" https://lakshya.example.com ").base_url,
        "https://lakshya.example.com"
    );
    assert_eq!(ClientConfig::default().base_url, DEFAULT_API_URL);
    assert_eq!(ClientConfig::default().timeout, Duration::from_secs(30));
    assert!(ClientConfig::default().user_agent.starts_with("lakshya/"));
}
