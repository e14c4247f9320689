pub mod account;
pub mod serve;
pub mod upgrade;

// The match over every action lives in `run` so this module only declares them.
mod run;

use crate::{
    api::ApiClient,
    config::ClientConfig,
    session::{FileStore, SessionStore},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};

pub const COOKIE_JAR_FILE: &str = "cookies.json";
pub const STORAGE_FILE: &str = "storage.json";

#[derive(Debug)]
pub enum Action {
    Serve(serve::Args),
    Login(account::LoginArgs),
    Register(account::RegisterArgs),
    Logout(ApiArgs),
    Whoami(ApiArgs),
    Balance(account::BalanceArgs),
    Notifications(account::NotificationArgs),
    Upgrade(upgrade::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// Where the API lives and where the session is kept between runs.
#[derive(Clone, Debug)]
pub struct ApiArgs {
    pub api_base_url: String,
    pub request_timeout_seconds: u64,
    pub state_dir: PathBuf,
}

impl ApiArgs {
    /// Cookie jar and persistent storage as two files in the state directory.
    #[must_use]
    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(
            Arc::new(FileStore::new(self.state_dir.join(COOKIE_JAR_FILE))),
            Arc::new(FileStore::new(self.state_dir.join(STORAGE_FILE))),
        )
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_base_url.clone())
            .with_request_timeout_seconds(self.request_timeout_seconds)
    }

    /// # Errors
    /// Returns an error if the base URL is missing or the HTTP client cannot
    /// be built.
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::connect(self.client_config(), self.session_store())
            .context("failed to create API client, is --api-base-url set?")
    }
}
