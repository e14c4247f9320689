//! Reactive auth state: the cached user plus the login/register/logout flows
//! that keep it in sync with the session store.

use crate::{
    api::{ApiClient, auth, types::User},
    errors::AppError,
    session::SessionStore,
};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// What observers see. `is_authenticated` is derived from the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
}

impl AuthSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Clone)]
pub struct AuthState {
    client: ApiClient,
    sender: watch::Sender<AuthSnapshot>,
}

impl AuthState {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let (sender, _) = watch::channel(AuthSnapshot::default());
        Self { client, sender }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn store(&self) -> &SessionStore {
        self.client.store()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.sender.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_authenticated()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.sender.subscribe()
    }

    fn publish(&self, user: Option<User>) {
        self.sender.send_replace(AuthSnapshot { user });
    }

    /// Restores the session on boot: publishes the cached user right away,
    /// then revalidates against the profile endpoint. A rejected session is
    /// cleared; a transient failure keeps the cached user.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the session store cannot be read or
    /// cleared.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Result<AuthSnapshot, AppError> {
        if !self.store().has_session()? {
            self.publish(None);
            return Ok(self.snapshot());
        }

        let cached = self.store().user()?;
        self.publish(cached.clone());

        match auth::fetch_profile(&self.client).await {
            Ok(user) => {
                self.store().save_user(&user)?;
                self.publish(Some(user));
            }
            Err(err) if err.is_auth_failure() => {
                info!("stored session rejected, clearing");
                self.store().clear()?;
                self.publish(None);
            }
            Err(err) => {
                warn!("profile revalidation failed, keeping cached user: {err}");
                if cached.is_none() {
                    return Err(err);
                }
            }
        }

        Ok(self.snapshot())
    }

    /// Logs in and persists tokens through the session store. With
    /// `remember_me` the email is kept for the next login form; without it any
    /// previously remembered email is forgotten.
    ///
    /// # Errors
    /// Returns the login error or `AppError::Storage`.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        remember_me: bool,
    ) -> Result<User, AppError> {
        let email = email.trim();
        let response = auth::login(&self.client, email, password).await?;
        self.store().save_tokens(&response.tokens())?;

        let user = match response.user {
            Some(user) => user,
            None => auth::fetch_profile(&self.client).await?,
        };
        self.store().save_user(&user)?;
        self.store()
            .set_remembered_email(remember_me.then_some(email))?;

        info!(user_id = %user.id, "logged in");
        self.publish(Some(user.clone()));
        Ok(user)
    }

    /// Creates an account. The caller still has to log in.
    ///
    /// # Errors
    /// Returns the registration error.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        password: &SecretString,
    ) -> Result<User, AppError> {
        auth::register(
            &self.client,
            full_name.trim(),
            email.trim(),
            phone.map(str::trim).filter(|phone| !phone.is_empty()),
            password,
        )
        .await
    }

    /// Logs out. The server call is best effort; local state is always
    /// cleared afterwards.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the session store cannot be cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AppError> {
        if self.store().has_session()?
            && let Err(err) = auth::logout(&self.client).await
        {
            warn!("server logout failed, clearing local session anyway: {err}");
        }

        self.store().clear()?;
        self.publish(None);
        info!("logged out");
        Ok(())
    }
}
