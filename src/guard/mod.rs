//! Route guard for the web application's pages.
//!
//! Every navigation to a protected prefix must carry an `access_token`
//! cookie, otherwise the browser is sent to the login page with the original
//! location in `redirect`. With verification enabled the token is also
//! checked against the API; an invalid token is refreshed from the
//! `refresh_token` cookie when possible, and the new pair is written back as
//! `Set-Cookie` headers. Unprotected paths pass through untouched.

pub mod cookies;
pub mod middleware;
pub mod verifier;

pub use middleware::{GuardState, route_guard};
pub use verifier::TokenVerifier;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

pub const DEFAULT_PROTECTED_PREFIXES: [&str; 7] = [
    "/dashboard",
    "/wallet",
    "/trips",
    "/stations/manage",
    "/role-upgrade",
    "/notifications",
    "/profile",
];
pub const DEFAULT_LOGIN_PATH: &str = "/login";
/// Cookie lifetime used when a token carries no `exp` claim.
pub const DEFAULT_COOKIE_MAX_AGE_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct GuardConfig {
    protected_prefixes: Vec<String>,
    login_path: String,
    verify_tokens: bool,
    secure_cookies: bool,
    cookie_max_age_seconds: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            protected_prefixes: DEFAULT_PROTECTED_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            verify_tokens: false,
            secure_cookies: false,
            cookie_max_age_seconds: DEFAULT_COOKIE_MAX_AGE_SECONDS,
        }
    }

    #[must_use]
    pub fn with_protected_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    #[must_use]
    pub fn with_verify_tokens(mut self, verify_tokens: bool) -> Self {
        self.verify_tokens = verify_tokens;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    #[must_use]
    pub fn with_cookie_max_age_seconds(mut self, seconds: u64) -> Self {
        self.cookie_max_age_seconds = seconds;
        self
    }

    /// Prefixes become `/segment[/segment..]` without a trailing slash; blank
    /// entries are dropped. A blank login path falls back to the default.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        self.protected_prefixes = self
            .protected_prefixes
            .iter()
            .map(|prefix| prefix.trim().trim_end_matches('/'))
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| {
                if prefix.starts_with('/') {
                    prefix.to_string()
                } else {
                    format!("/{prefix}")
                }
            })
            .collect();
        self.protected_prefixes.sort();
        self.protected_prefixes.dedup();

        let login = self.login_path.trim();
        self.login_path = if login.is_empty() {
            DEFAULT_LOGIN_PATH.to_string()
        } else {
            login.to_string()
        };
        if self.cookie_max_age_seconds == 0 {
            self.cookie_max_age_seconds = DEFAULT_COOKIE_MAX_AGE_SECONDS;
        }
        self
    }

    #[must_use]
    pub fn protected_prefixes(&self) -> &[String] {
        &self.protected_prefixes
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn verify_tokens(&self) -> bool {
        self.verify_tokens
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    #[must_use]
    pub fn cookie_max_age_seconds(&self) -> u64 {
        self.cookie_max_age_seconds
    }

    /// Segment-aware prefix match: `/wallet` covers `/wallet` and
    /// `/wallet/topup` but not `/walletx`. The login page is never protected.
    /// Matching runs on [`canonical_path`], the path the file server resolves.
    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        let path = canonical_path(path);
        let path = path.as_str();
        if path == self.login_path || path.starts_with(&format!("{}/", self.login_path)) {
            return false;
        }
        self.protected_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    /// `<login>?redirect=<original>` with the original path and query encoded.
    #[must_use]
    pub fn login_redirect(&self, original: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", original)
            .finish();
        format!("{}?{query}", self.login_path)
    }
}

/// Percent-decodes `path` and drops empty and `.` segments, resolving `..`,
/// so `/%64ashboard/` and `//dashboard/` both become `/dashboard`.
#[must_use]
pub fn canonical_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}
