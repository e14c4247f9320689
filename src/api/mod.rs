//! HTTP client for the commuter REST API.
//!
//! [`ApiClient`] wraps a `reqwest::Client` with the configured base URL and
//! timeout, attaches the bearer token (and CSRF cookie value) to every
//! authenticated call, and retries exactly once after a refresh when the API
//! answers 401. Feature modules expose one free function per endpoint on top
//! of the JSON helpers here, so request setup and error mapping live in a
//! single place. Error bodies are sanitized before they reach the user; token
//! material is never logged.

pub mod auth;
pub mod notifications;
pub mod roles;
pub mod stations;
pub mod trips;
pub mod types;
pub mod wallet;

use crate::{
    APP_USER_AGENT,
    config::ClientConfig,
    errors::AppError,
    session::{SessionStore, TokenManager},
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart::Form};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: TokenManager,
}

impl ApiClient {
    /// Builds the HTTP client, the refresh endpoint client and the token
    /// manager around `store`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is missing or the HTTP
    /// client cannot be built.
    pub fn connect(config: ClientConfig, store: SessionStore) -> Result<Self, AppError> {
        let config = config.normalize();
        if config.api_base_url().is_empty() {
            return Err(AppError::Config(
                "API base URL is not configured.".to_string(),
            ));
        }

        let http = build_http_client(&config)?;
        let refresher = Arc::new(auth::TokenEndpoints::new(http.clone(), config.clone()));
        let tokens = TokenManager::new(store, refresher, config.refresh_leeway());

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        self.tokens.store()
    }

    /// Unauthenticated verify/refresh endpoints sharing this client's pool.
    #[must_use]
    pub fn token_endpoints(&self) -> auth::TokenEndpoints {
        auth::TokenEndpoints::new(self.http.clone(), self.config.clone())
    }

    /// GET with bearer auth, decoding a JSON body.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(Method::GET, &url)))
            .await?;
        handle_json_response(response).await
    }

    /// GET with query parameters and bearer auth.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors.
    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(Method::GET, &url).query(query)))
            .await?;
        handle_json_response(response).await
    }

    /// Sends a JSON body with bearer auth and decodes a JSON response.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(method.clone(), &url).json(body)))
            .await?;
        handle_json_response(response).await
    }

    /// POST with a JSON body and bearer auth.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    /// POST with a JSON body and bearer auth, ignoring the response body.
    ///
    /// # Errors
    /// Returns network or HTTP errors.
    pub async fn post_json_empty<B>(&self, path: &str, body: &B) -> Result<(), AppError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(Method::POST, &url).json(body)))
            .await?;
        handle_empty_response(response).await
    }

    /// POST without a body, ignoring the response body.
    ///
    /// # Errors
    /// Returns network or HTTP errors.
    pub async fn post_empty(&self, path: &str) -> Result<(), AppError> {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(Method::POST, &url)))
            .await?;
        handle_empty_response(response).await
    }

    /// DELETE with bearer auth.
    ///
    /// # Errors
    /// Returns network or HTTP errors.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(Method::DELETE, &url)))
            .await?;
        handle_empty_response(response).await
    }

    /// POST a multipart form with bearer auth. Forms cannot be cloned, so
    /// `build_form` is invoked again for the retry after a refresh.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors.
    pub async fn post_multipart<T, F>(&self, path: &str, build_form: F) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<Form, AppError>,
    {
        let url = self.config.url(path);
        let response = self
            .send_authorized(|http| Ok(http.request(Method::POST, &url).multipart(build_form()?)))
            .await?;
        handle_json_response(response).await
    }

    /// POST JSON without credentials, for login/register style endpoints.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors.
    pub async fn post_json_public<B, T>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    /// Sends a request with the current token; on 401 refreshes once and
    /// retries with the new token. A second 401 is returned to the caller.
    #[instrument(skip(self, build))]
    async fn send_authorized<F>(&self, mut build: F) -> Result<Response, AppError>
    where
        F: FnMut(&reqwest::Client) -> Result<RequestBuilder, AppError>,
    {
        let token = self.tokens.valid_access_token().await?;
        let response = self.send_once(&mut build, token.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || self.tokens.store().refresh_token()?.is_none()
        {
            return Ok(response);
        }

        debug!("request rejected with 401, refreshing and retrying once");
        let used = token.as_ref().map(|token| token.expose_secret().to_string());
        let fresh = self.tokens.refresh_after_rejection(used.as_deref()).await?;
        self.send_once(&mut build, Some(&fresh)).await
    }

    async fn send_once<F>(
        &self,
        build: &mut F,
        token: Option<&SecretString>,
    ) -> Result<Response, AppError>
    where
        F: FnMut(&reqwest::Client) -> Result<RequestBuilder, AppError>,
    {
        let mut request = build(&self.http)?;
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(csrf) = self.tokens.store().csrf_token()? {
            request = request.header(CSRF_HEADER, csrf);
        }
        request.send().await.map_err(map_request_error)
    }
}

fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(config.request_timeout())
        .build()
        .map_err(|err| AppError::Config(format!("Failed to build HTTP client: {err}")))
}

/// Maps transport errors into timeout or network failures.
pub(crate) fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        AppError::Serialization(format!("Failed to build request: {err}"))
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
pub(crate) async fn handle_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Handles empty responses and returns sanitized HTTP errors when needed.
pub(crate) async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(http_error(response).await)
    }
}

async fn http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Sanitizes HTTP error bodies for user-facing messages by trimming and truncating.
#[must_use]
pub fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
