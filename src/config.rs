//! Client configuration for the REST API the session layer talks to.
//!
//! Values come from `COMMUTER_*` environment variables (or CLI flags that
//! default to them) and can be adjusted with the `with_*` builders. None of
//! these values are secrets.

use std::time::Duration;

/// Default request timeout applied to every API call.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
/// Tokens expiring within this window are refreshed before use.
pub const DEFAULT_REFRESH_LEEWAY_SECONDS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: String,
    request_timeout: Duration,
    refresh_leeway: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            refresh_leeway: Duration::from_secs(DEFAULT_REFRESH_LEEWAY_SECONDS),
        }
    }

    /// Loads the API host from `COMMUTER_API_BASE_URL`, falling back to
    /// `COMMUTER_API_HOST`.
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("COMMUTER_API_BASE_URL")
            .ok()
            .and_then(|value| normalize_value(&value))
            .or_else(|| {
                std::env::var("COMMUTER_API_HOST")
                    .ok()
                    .and_then(|value| normalize_value(&value))
            })
            .unwrap_or_default();

        Self::new(api_base_url)
    }

    #[must_use]
    pub fn with_request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_refresh_leeway_seconds(mut self, seconds: u64) -> Self {
        self.refresh_leeway = Duration::from_secs(seconds);
        self
    }

    /// Replaces a zero timeout with one second so requests cannot hang.
    #[must_use]
    pub fn normalize(self) -> Self {
        let request_timeout = if self.request_timeout.is_zero() {
            Duration::from_secs(1)
        } else {
            self.request_timeout
        };
        Self {
            api_base_url: self.api_base_url.trim().trim_end_matches('/').to_string(),
            request_timeout,
            refresh_leeway: self.refresh_leeway,
        }
    }

    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn refresh_leeway(&self) -> Duration {
        self.refresh_leeway
    }

    /// Joins the configured base URL and a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.api_base_url, path)
    }
}

/// Builds a URL from an explicit base URL and the provided path.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_without_double_slashes() {
        assert_eq!(
            build_url_with_base("https://api.commuter.app/", "/api/wallet/"),
            "https://api.commuter.app/api/wallet/"
        );
        assert_eq!(build_url_with_base("  ", "/api/wallet/"), "/api/wallet/");
    }

    #[test]
    fn from_env_prefers_base_url_over_host() {
        temp_env::with_vars(
            [
                ("COMMUTER_API_BASE_URL", Some(" https://api.base ")),
                ("COMMUTER_API_HOST", Some("https://api.host")),
            ],
            || {
                let config = ClientConfig::from_env();
                assert_eq!(config.api_base_url(), "https://api.base");
            },
        );
    }

    #[test]
    fn from_env_falls_back_to_host() {
        temp_env::with_vars(
            [
                ("COMMUTER_API_BASE_URL", Some("   ")),
                ("COMMUTER_API_HOST", Some("https://api.host")),
            ],
            || {
                let config = ClientConfig::from_env();
                assert_eq!(config.api_base_url(), "https://api.host");
            },
        );
    }

    #[test]
    fn normalize_trims_base_and_zero_timeout() {
        let config = ClientConfig::new("https://api.commuter.app/ ")
            .with_request_timeout_seconds(0)
            .normalize();
        assert_eq!(config.api_base_url(), "https://api.commuter.app");
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
        assert_eq!(
            config.refresh_leeway(),
            Duration::from_secs(DEFAULT_REFRESH_LEEWAY_SECONDS)
        );
    }
}
