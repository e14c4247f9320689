//! axum middleware applying [`GuardConfig`](super::GuardConfig) to each
//! request.

use super::{
    GuardConfig,
    cookies::{clear_cookie, cookie_value, replace_cookies, token_cookie},
    verifier::TokenVerifier,
};
use crate::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, jwt};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct GuardState {
    config: Arc<GuardConfig>,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl GuardState {
    /// Cookie presence only.
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config: Arc::new(config.normalize()),
            verifier: None,
        }
    }

    /// Verification runs only when the config enables it.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    fn active_verifier(&self) -> Option<&Arc<dyn TokenVerifier>> {
        self.verifier
            .as_ref()
            .filter(|_| self.config.verify_tokens())
    }
}

/// Gates protected paths. Use with `axum::middleware::from_fn_with_state`.
pub async fn route_guard(
    State(state): State<GuardState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !state.config.is_protected(&path) {
        return next.run(request).await;
    }

    let original = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), |pq| pq.as_str().to_string());

    let Some(access) = cookie_value(request.headers(), ACCESS_TOKEN_KEY) else {
        debug!(path = %path, "no access token cookie, redirecting to login");
        return login_redirect(&state.config, &original, false);
    };

    let Some(verifier) = state.active_verifier() else {
        return next.run(request).await;
    };

    match verifier.verify(&access).await {
        Ok(true) => return next.run(request).await,
        Ok(false) => debug!(path = %path, "access token rejected"),
        Err(err) if err.is_auth_failure() => {
            debug!(path = %path, "access token rejected: {err}");
        }
        Err(err) => {
            warn!(path = %path, "token verification unavailable, letting request through: {err}");
            return next.run(request).await;
        }
    }

    let Some(refresh) = cookie_value(request.headers(), REFRESH_TOKEN_KEY) else {
        return login_redirect(&state.config, &original, true);
    };

    let pair = match verifier.refresh(&refresh).await {
        Ok(pair) => pair,
        Err(err) => {
            info!(path = %path, "token refresh failed, redirecting to login: {err}");
            return login_redirect(&state.config, &original, true);
        }
    };

    let refresh_value = pair.refresh.as_deref().unwrap_or(&refresh);
    let cookies = match refreshed_cookies(&state.config, &pair.access, refresh_value) {
        Ok(cookies) => cookies,
        Err(err) => {
            warn!(path = %path, "refreshed token is not cookie-safe: {err}");
            return login_redirect(&state.config, &original, true);
        }
    };
    if let Err(err) = replace_cookies(
        request.headers_mut(),
        &[(ACCESS_TOKEN_KEY, &pair.access), (REFRESH_TOKEN_KEY, refresh_value)],
    ) {
        warn!(path = %path, "failed to forward refreshed cookies: {err}");
    }

    let mut response = next.run(request).await;
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

fn refreshed_cookies(
    config: &GuardConfig,
    access: &str,
    refresh: &str,
) -> Result<[HeaderValue; 2], axum::http::header::InvalidHeaderValue> {
    let access_max_age = jwt::expires_at(access)
        .map_or(config.cookie_max_age_seconds(), |exp| {
            exp.saturating_sub(jwt::now_unix())
        });
    Ok([
        token_cookie(ACCESS_TOKEN_KEY, access, access_max_age, config.secure_cookies())?,
        token_cookie(
            REFRESH_TOKEN_KEY,
            refresh,
            config.cookie_max_age_seconds(),
            config.secure_cookies(),
        )?,
    ])
}

/// 307 to the login page. With `clear_tokens` both token cookies are expired
/// so the browser stops presenting a dead session.
fn login_redirect(config: &GuardConfig, original: &str, clear_tokens: bool) -> Response {
    let mut response = Redirect::temporary(&config.login_redirect(original)).into_response();
    if clear_tokens {
        for name in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Ok(cookie) = clear_cookie(name, config.secure_cookies()) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
        }
    }
    response
}
