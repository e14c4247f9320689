//! Token manager: hands out usable access tokens and owns the refresh policy.

use super::{jwt, refresh::RefreshGate, store::SessionStore};
use crate::{api::types::TokenPair, errors::AppError};
use secrecy::{ExposeSecret, SecretString};
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};
use tracing::{info, instrument, warn};

/// Exchanges a refresh token for a new pair.
pub trait TokenRefresher: Send + Sync {
    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<TokenPair, AppError>> + Send + 'a>>;
}

#[derive(Clone)]
pub struct TokenManager {
    store: SessionStore,
    refresher: Arc<dyn TokenRefresher>,
    gate: Arc<RefreshGate>,
    leeway: Duration,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: SessionStore, refresher: Arc<dyn TokenRefresher>, leeway: Duration) -> Self {
        Self {
            store,
            refresher,
            gate: Arc::new(RefreshGate::new()),
            leeway,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Best available token, without checking expiry.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the store cannot be read.
    pub fn access_token(&self) -> Result<Option<SecretString>, AppError> {
        self.store.access_token()
    }

    /// A token that is not about to expire, refreshing first when needed.
    /// `Ok(None)` means there is no session at all.
    ///
    /// # Errors
    /// Returns the refresh error when the stored token is expired and cannot
    /// be renewed.
    pub async fn valid_access_token(&self) -> Result<Option<SecretString>, AppError> {
        let Some(token) = self.store.access_token()? else {
            return Ok(None);
        };

        if jwt::is_expired(token.expose_secret(), self.leeway) {
            info!("access token expired or expiring, refreshing");
            return self.refresh().await.map(Some);
        }

        Ok(Some(token))
    }

    /// Refreshes the session. Concurrent callers share a single request.
    ///
    /// A 401/403 from the refresh endpoint clears every stored token. Any
    /// other failure leaves the tokens in place so a transient outage does not
    /// log the user out.
    ///
    /// # Errors
    /// Returns `AppError::Unauthorized` without a network call when no refresh
    /// token is stored, otherwise the refresh error.
    pub async fn refresh(&self) -> Result<SecretString, AppError> {
        let pair = self.gate.run(|| self.refresh_once()).await?;
        Ok(SecretString::from(pair.access))
    }

    /// Refreshes only if `used_token` is still the stored token; if another
    /// request already rotated it, the stored token is returned instead.
    ///
    /// # Errors
    /// See [`TokenManager::refresh`].
    pub async fn refresh_after_rejection(
        &self,
        used_token: Option<&str>,
    ) -> Result<SecretString, AppError> {
        if let (Some(used), Some(current)) = (used_token, self.store.access_token()?)
            && used != current.expose_secret()
        {
            return Ok(current);
        }
        self.refresh().await
    }

    #[instrument(skip(self))]
    async fn refresh_once(&self) -> Result<TokenPair, AppError> {
        let Some(refresh_token) = self.store.refresh_token()? else {
            return Err(AppError::Unauthorized("no refresh token stored".to_string()));
        };

        match self.refresher.refresh(refresh_token.expose_secret()).await {
            Ok(pair) => {
                self.store.save_tokens(&pair)?;
                info!("session refreshed");
                Ok(pair)
            }
            Err(err) if err.is_auth_failure() => {
                warn!("refresh rejected, clearing tokens: {err}");
                self.store.clear_tokens()?;
                Err(err)
            }
            Err(err) => {
                warn!("refresh failed, keeping tokens: {err}");
                Err(err)
            }
        }
    }
}
