//! # Commuter (session layer for the commuter web platform)
//!
//! `commuter` keeps a rider signed in to the commuter REST API and gates the
//! web application's protected pages.
//!
//! ## Sessions
//!
//! Access and refresh tokens live in two mediums, a cookie jar and persistent
//! storage, behind a single [`session::SessionStore`]. The
//! [`session::TokenManager`] reads the JWT `exp` claim locally and refreshes
//! shortly before expiry. Concurrent callers that hit an expired token share
//! one refresh request. A refresh rejected with 401/403 clears every token;
//! transient failures leave the session alone.
//!
//! ## API client
//!
//! [`api::ApiClient`] attaches the bearer token and CSRF header and retries a
//! request once after refreshing when the API answers 401. Typed endpoint
//! functions cover auth, wallet, stations, trips, contributions, role
//! upgrades and notifications.
//!
//! ## Route guard
//!
//! [`guard::route_guard`] is an axum middleware that redirects navigations to
//! protected prefixes to the login page when no `access_token` cookie is
//! present, optionally verifying and refreshing the token against the API.
//! The `commuter serve` gateway puts it in front of the web app's pages.
//!
//! ## Role upgrades
//!
//! [`upgrade`] validates role applications, submits them as multipart forms,
//! caches picked files, scopes camera streams and polls the verification
//! status in a cancellable background task.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod guard;
pub mod inbox;
pub mod notice;
pub mod session;
pub mod upgrade;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
