//! Authentication endpoints: login, registration, logout, profile, and the
//! token verify/refresh pair used by the token manager and the route guard.
//! Passwords and tokens pass through here and must never be logged.

use super::{
    ApiClient, handle_empty_response, handle_json_response, map_request_error,
    types::{
        LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, TokenPair, User,
        VerifyTokenRequest,
    },
};
use crate::{config::ClientConfig, errors::AppError, session::TokenRefresher};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::{future::Future, pin::Pin};
use tracing::{instrument, warn};

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const REGISTER_PATH: &str = "/api/auth/register/";
pub const LOGOUT_PATH: &str = "/api/auth/logout/";
pub const PROFILE_PATH: &str = "/api/auth/profile/";
pub const VERIFY_PATH: &str = "/api/auth/token/verify/";
pub const REFRESH_PATH: &str = "/api/auth/token/refresh/";

/// Unauthenticated token endpoints. Kept apart from [`ApiClient`] so a
/// refresh never recurses into the bearer/retry path.
#[derive(Clone, Debug)]
pub struct TokenEndpoints {
    http: reqwest::Client,
    config: ClientConfig,
}

impl TokenEndpoints {
    #[must_use]
    pub fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// Asks the API whether `token` is still valid. 400/401/403 mean "invalid";
    /// other failures are returned as errors so callers can tell an outage
    /// from a rejection.
    ///
    /// # Errors
    /// Returns network errors and unexpected HTTP statuses.
    #[instrument(skip(self, token))]
    pub async fn verify(&self, token: &str) -> Result<bool, AppError> {
        let response = self
            .http
            .post(self.config.url(VERIFY_PATH))
            .json(&VerifyTokenRequest { token })
            .send()
            .await
            .map_err(map_request_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Ok(false)
            }
            _ => handle_empty_response(response).await.map(|()| false),
        }
    }

    /// Exchanges a refresh token for a new pair.
    ///
    /// # Errors
    /// Returns the HTTP error (401/403 when the refresh token is rejected).
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_pair(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let response = self
            .http
            .post(self.config.url(REFRESH_PATH))
            .json(&RefreshTokenRequest {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }
}

impl TokenRefresher for TokenEndpoints {
    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TokenPair, AppError>> + Send + 'a>> {
        Box::pin(self.refresh_pair(refresh_token))
    }
}

/// Logs in with email and password. Does not touch the session store; the
/// auth state decides what to persist.
///
/// # Errors
/// Returns the HTTP error (401/400 for bad credentials) or a parse error.
#[instrument(skip_all)]
pub async fn login(
    client: &ApiClient,
    email: &str,
    password: &SecretString,
) -> Result<LoginResponse, AppError> {
    client
        .post_json_public(
            LOGIN_PATH,
            &LoginRequest {
                email,
                password: password.expose_secret(),
            },
        )
        .await
}

/// Creates an account. Registration never logs the user in.
///
/// # Errors
/// Returns the HTTP error (400 with field messages on validation failure).
#[instrument(skip_all)]
pub async fn register(
    client: &ApiClient,
    full_name: &str,
    email: &str,
    phone: Option<&str>,
    password: &SecretString,
) -> Result<User, AppError> {
    client
        .post_json_public(
            REGISTER_PATH,
            &RegisterRequest {
                full_name,
                email,
                phone,
                password: password.expose_secret(),
            },
        )
        .await
}

/// Invalidates the refresh token on the server.
///
/// # Errors
/// Returns network or HTTP errors.
#[instrument(skip(client))]
pub async fn logout(client: &ApiClient) -> Result<(), AppError> {
    match client.store().refresh_token()? {
        Some(refresh) => {
            client
                .post_json_empty(
                    LOGOUT_PATH,
                    &RefreshTokenRequest {
                        refresh: refresh.expose_secret(),
                    },
                )
                .await
        }
        None => {
            warn!("logging out without a refresh token");
            client.post_empty(LOGOUT_PATH).await
        }
    }
}

/// Fetches the signed-in user's profile.
///
/// # Errors
/// Returns network, HTTP or parse errors.
pub async fn fetch_profile(client: &ApiClient) -> Result<User, AppError> {
    client.get_json(PROFILE_PATH).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoints(server: &MockServer) -> Result<TokenEndpoints, AppError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Config(err.to_string()))?;
        Ok(TokenEndpoints::new(http, ClientConfig::new(server.uri())))
    }

    #[tokio::test]
    async fn verify_maps_statuses() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .and(body_json(json!({ "token": "good" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .and(body_json(json!({ "token": "bad" })))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .and(body_json(json!({ "token": "forbidden" })))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(VERIFY_PATH))
            .and(body_json(json!({ "token": "boom" })))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let endpoints = endpoints(&server)?;
        assert!(endpoints.verify("good").await?);
        assert!(!endpoints.verify("bad").await?);
        assert!(!endpoints.verify("forbidden").await?);
        assert!(matches!(
            endpoints.verify("boom").await,
            Err(AppError::Http { status: 502, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn refresh_posts_refresh_token() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({ "refresh": "r1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access": "a2", "refresh": "r2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pair = endpoints(&server)?.refresh_pair("r1").await?;
        assert_eq!(pair.access, "a2");
        assert_eq!(pair.refresh.as_deref(), Some("r2"));
        Ok(())
    }

    #[tokio::test]
    async fn login_returns_tokens_and_user() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": "a1",
                "refresh": "r1",
                "user": { "id": 3, "full_name": "Ada", "email": "ada@example.com" }
            })))
            .mount(&server)
            .await;

        let client = ApiClient::connect(ClientConfig::new(server.uri()), SessionStore::in_memory())?;
        let response = login(&client, "ada@example.com", &SecretString::from("pw".to_string())).await?;
        assert_eq!(response.tokens().access, "a1");
        assert_eq!(response.user.map(|user| user.id), Some("3".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn logout_sends_refresh_token() -> Result<(), AppError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .and(body_json(json!({ "refresh": "r1" })))
            .respond_with(ResponseTemplate::new(205))
            .expect(1)
            .mount(&server)
            .await;

        let store = SessionStore::in_memory();
        store.save_tokens(&TokenPair {
            access: "opaque-access".to_string(),
            refresh: Some("r1".to_string()),
        })?;
        let client = ApiClient::connect(ClientConfig::new(server.uri()), store)?;
        logout(&client).await
    }
}
