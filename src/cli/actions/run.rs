use crate::cli::actions::{Action, account, serve, upgrade};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Serve(args) => serve::execute(args).await,
        Action::Login(args) => account::login(args).await,
        Action::Register(args) => account::register(args).await,
        Action::Logout(args) => account::logout(&args).await,
        Action::Whoami(args) => account::whoami(&args).await,
        Action::Balance(args) => account::balance(&args).await,
        Action::Notifications(args) => account::notifications(args).await,
        Action::Upgrade(args) => upgrade::execute(args).await,
    }
}
