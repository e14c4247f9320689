//! The authoritative session store.
//!
//! Tokens are mirrored into two mediums: the cookie jar (what the page server
//! and route guard see) and persistent storage (what the client reads after a
//! restart). All writes go through [`SessionStore::save_tokens`] so the two
//! never drift; reads prefer cookies, then persistent storage, then the legacy
//! `civic_jwt` key, which is migrated into the canonical keys on first read.

use super::{
    ACCESS_TOKEN_KEY, CSRF_TOKEN_KEY, EMAIL_KEY, LEGACY_ACCESS_TOKEN_KEYS, REFRESH_TOKEN_KEY,
    REMEMBER_ME_KEY, USER_KEY, jwt,
    storage::{KeyValueStore, MemoryStore},
};
use crate::{
    api::types::{TokenPair, User},
    errors::AppError,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of the stored credentials.
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Unix seconds taken from the JWT `exp` claim, if any.
    pub expires_at: Option<u64>,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now_unix: u64, leeway_seconds: u64) -> bool {
        self.expires_at
            .is_some_and(|exp| exp <= now_unix.saturating_add(leeway_seconds))
    }
}

#[derive(Clone)]
pub struct SessionStore {
    cookies: Arc<dyn KeyValueStore>,
    persistent: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(cookies: Arc<dyn KeyValueStore>, persistent: Arc<dyn KeyValueStore>) -> Self {
        Self {
            cookies,
            persistent,
        }
    }

    /// Store backed by two fresh in-memory mediums.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    #[must_use]
    pub fn cookies(&self) -> &Arc<dyn KeyValueStore> {
        &self.cookies
    }

    #[must_use]
    pub fn persistent(&self) -> &Arc<dyn KeyValueStore> {
        &self.persistent
    }

    /// Best available access token.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be read or the legacy
    /// migration cannot be written.
    pub fn access_token(&self) -> Result<Option<SecretString>, AppError> {
        if let Some(token) = non_empty(self.cookies.get(ACCESS_TOKEN_KEY)?) {
            return Ok(Some(SecretString::from(token)));
        }
        if let Some(token) = non_empty(self.persistent.get(ACCESS_TOKEN_KEY)?) {
            return Ok(Some(SecretString::from(token)));
        }

        for key in LEGACY_ACCESS_TOKEN_KEYS {
            if let Some(token) = non_empty(self.persistent.get(key)?) {
                debug!(key, "migrating legacy access token key");
                self.write_pair(&token, None)?;
                self.persistent.remove(key)?;
                return Ok(Some(SecretString::from(token)));
            }
        }

        Ok(None)
    }

    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be read.
    pub fn refresh_token(&self) -> Result<Option<SecretString>, AppError> {
        let token = match non_empty(self.cookies.get(REFRESH_TOKEN_KEY)?) {
            Some(token) => Some(token),
            None => non_empty(self.persistent.get(REFRESH_TOKEN_KEY)?),
        };
        Ok(token.map(SecretString::from))
    }

    /// # Errors
    /// Returns `AppError::Storage` if the cookie jar cannot be read.
    pub fn csrf_token(&self) -> Result<Option<String>, AppError> {
        Ok(non_empty(self.cookies.get(CSRF_TOKEN_KEY)?))
    }

    /// # Errors
    /// Returns `AppError::Storage` if the cookie jar cannot be written.
    pub fn set_csrf_token(&self, token: &str) -> Result<(), AppError> {
        self.cookies.set(CSRF_TOKEN_KEY, token)
    }

    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be read.
    pub fn session(&self) -> Result<Option<Session>, AppError> {
        let Some(access_token) = self.access_token()? else {
            return Ok(None);
        };
        let expires_at = jwt::expires_at(access_token.expose_secret());
        Ok(Some(Session {
            access_token,
            refresh_token: self.refresh_token()?,
            expires_at,
        }))
    }

    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be read.
    pub fn has_session(&self) -> Result<bool, AppError> {
        Ok(self.access_token()?.is_some())
    }

    /// Single write path for credentials. A pair without a refresh token keeps
    /// the one already stored (refresh responses often omit it).
    ///
    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be written.
    pub fn save_tokens(&self, tokens: &TokenPair) -> Result<(), AppError> {
        self.write_pair(&tokens.access, tokens.refresh.as_deref())?;
        for key in LEGACY_ACCESS_TOKEN_KEYS {
            self.persistent.remove(key)?;
        }
        Ok(())
    }

    fn write_pair(&self, access: &str, refresh: Option<&str>) -> Result<(), AppError> {
        for medium in [&self.cookies, &self.persistent] {
            medium.set(ACCESS_TOKEN_KEY, access)?;
            if let Some(refresh) = refresh {
                medium.set(REFRESH_TOKEN_KEY, refresh)?;
            }
        }
        Ok(())
    }

    /// Cached profile, if one was stored and still parses.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if persistent storage cannot be read.
    pub fn user(&self) -> Result<Option<User>, AppError> {
        let Some(raw) = non_empty(self.persistent.get(USER_KEY)?) else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!("discarding unreadable cached user: {err}");
                self.persistent.remove(USER_KEY)?;
                Ok(None)
            }
        }
    }

    /// # Errors
    /// Returns `AppError::Storage` if persistent storage cannot be written.
    pub fn save_user(&self, user: &User) -> Result<(), AppError> {
        let raw = serde_json::to_string(user)
            .map_err(|err| AppError::Serialization(format!("Failed to encode user: {err}")))?;
        self.persistent.set(USER_KEY, &raw)
    }

    /// Stores (or forgets) the login email for the "remember me" option.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if persistent storage cannot be written.
    pub fn set_remembered_email(&self, email: Option<&str>) -> Result<(), AppError> {
        match email {
            Some(email) => {
                self.persistent.set(REMEMBER_ME_KEY, "true")?;
                self.persistent.set(EMAIL_KEY, email)
            }
            None => {
                self.persistent.remove(REMEMBER_ME_KEY)?;
                self.persistent.remove(EMAIL_KEY)
            }
        }
    }

    /// # Errors
    /// Returns `AppError::Storage` if persistent storage cannot be read.
    pub fn remembered_email(&self) -> Result<Option<String>, AppError> {
        if self.persistent.get(REMEMBER_ME_KEY)?.as_deref() != Some("true") {
            return Ok(None);
        }
        Ok(non_empty(self.persistent.get(EMAIL_KEY)?))
    }

    /// Removes every token key, canonical and legacy, from both mediums.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be written.
    pub fn clear_tokens(&self) -> Result<(), AppError> {
        for medium in [&self.cookies, &self.persistent] {
            medium.remove(ACCESS_TOKEN_KEY)?;
            medium.remove(REFRESH_TOKEN_KEY)?;
            for key in LEGACY_ACCESS_TOKEN_KEYS {
                medium.remove(key)?;
            }
        }
        Ok(())
    }

    /// Removes all token and user keys from both mediums. The remember-me
    /// email survives.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if a medium cannot be written.
    pub fn clear(&self) -> Result<(), AppError> {
        self.clear_tokens()?;
        self.cookies.remove(USER_KEY)?;
        self.persistent.remove(USER_KEY)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
