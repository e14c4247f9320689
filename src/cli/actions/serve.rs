use crate::{
    api::ApiClient,
    cli::actions::ApiArgs,
    gateway,
    guard::{GuardConfig, GuardState},
    session::SessionStore,
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub guard: GuardConfig,
    pub api: ApiArgs,
}

/// Builds the guard state. Token verification needs the API; it uses an
/// empty in-memory session because every token comes from the request.
///
/// # Errors
/// Returns an error if verification is enabled without an API base URL.
pub fn guard_state(args: &Args) -> Result<GuardState> {
    let state = GuardState::new(args.guard.clone());
    if !state.config().verify_tokens() {
        return Ok(state);
    }

    let client = ApiClient::connect(args.api.client_config(), SessionStore::in_memory())
        .context("--verify-tokens requires --api-base-url")?;
    Ok(state.with_verifier(Arc::new(client.token_endpoints())))
}

/// Execute the serve action.
/// # Errors
/// Returns an error if the guard cannot be configured or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let state = guard_state(&args)?;

    if let Some(dir) = &args.static_dir
        && !dir.is_dir()
    {
        warn!("static dir {} does not exist, every page will 404", dir.display());
    }

    let app = gateway::router(state, args.static_dir.as_deref());

    info!("Starting gateway on port {}", args.port);
    gateway::serve(args.port, app).await
}

fn log_startup_args(args: &Args) {
    debug!(
        port = args.port,
        static_dir = ?args.static_dir,
        login_path = args.guard.login_path(),
        protected_prefixes = ?args.guard.protected_prefixes(),
        verify_tokens = args.guard.verify_tokens(),
        api_base_url = %args.api.api_base_url,
        "gateway configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(verify: bool, api_base_url: &str) -> Args {
        Args {
            port: 0,
            static_dir: None,
            guard: GuardConfig::new().with_verify_tokens(verify),
            api: ApiArgs {
                api_base_url: api_base_url.to_string(),
                request_timeout_seconds: 5,
                state_dir: PathBuf::from(".commuter"),
            },
        }
    }

    #[test]
    fn verification_disabled_needs_no_api() {
        assert!(guard_state(&args(false, "")).is_ok());
    }

    #[test]
    fn verification_requires_api_base_url() {
        assert!(guard_state(&args(true, "")).is_err());
    }

    #[tokio::test]
    async fn verification_with_api_builds_verifier() {
        assert!(guard_state(&args(true, "http://127.0.0.1:9")).is_ok());
    }
}
