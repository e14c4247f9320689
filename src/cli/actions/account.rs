use crate::{
    api::wallet,
    auth::AuthState,
    cli::actions::ApiArgs,
    inbox::NotificationCenter,
};
use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Debug)]
pub struct LoginArgs {
    pub api: ApiArgs,
    pub email: String,
    pub password: Option<SecretString>,
    pub remember_me: bool,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub api: ApiArgs,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(Debug)]
pub struct BalanceArgs {
    pub api: ApiArgs,
    pub history: bool,
}

#[derive(Debug)]
pub struct NotificationArgs {
    pub api: ApiArgs,
    pub mark_read: Vec<String>,
    pub mark_all_read: bool,
}

async fn password_or_stdin(password: Option<SecretString>) -> Result<SecretString> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(SecretString::from(password))
}

/// # Errors
/// Returns an error if the credentials are rejected or the session cannot be
/// stored.
pub async fn login(args: LoginArgs) -> Result<()> {
    let password = password_or_stdin(args.password).await?;
    let auth = AuthState::new(args.api.client()?);

    let user = auth
        .login(&args.email, &password, args.remember_me)
        .await
        .context("login failed")?;

    info!(state_dir = %args.api.state_dir.display(), "session stored");
    println!("Logged in as {} <{}>", user.full_name, user.email);
    Ok(())
}

/// # Errors
/// Returns an error if the API rejects the registration.
pub async fn register(args: RegisterArgs) -> Result<()> {
    let password = password_or_stdin(args.password).await?;
    let auth = AuthState::new(args.api.client()?);

    let user = auth
        .register(&args.full_name, &args.email, args.phone.as_deref(), &password)
        .await
        .context("registration failed")?;

    println!("Registered {} <{}>, log in to continue", user.full_name, user.email);
    Ok(())
}

/// # Errors
/// Returns an error if the local session cannot be cleared.
pub async fn logout(api: &ApiArgs) -> Result<()> {
    let auth = AuthState::new(api.client()?);
    auth.logout().await?;
    println!("Logged out");
    Ok(())
}

/// # Errors
/// Returns an error if the stored session cannot be restored.
pub async fn whoami(api: &ApiArgs) -> Result<()> {
    let auth = AuthState::new(api.client()?);
    let snapshot = auth.hydrate().await?;

    match snapshot.user {
        Some(user) => {
            println!("{} <{}>", user.full_name, user.email);
            if let Some(phone) = user.phone {
                println!("phone: {phone}");
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

/// # Errors
/// Returns an error if the wallet cannot be fetched.
pub async fn balance(args: &BalanceArgs) -> Result<()> {
    let client = args.api.client()?;
    let balance = wallet::balance(&client).await?;
    println!(
        "Balance: {} {}",
        balance.balance,
        balance.currency.as_deref().unwrap_or_default()
    );

    if args.history {
        let transactions = wallet::transactions(&client).await?;
        debug!(count = transactions.len(), "fetched transactions");
        for tx in transactions {
            println!(
                "{}\t{}\t{}\t{}",
                tx.created_at.as_deref().unwrap_or("-"),
                tx.kind,
                tx.amount,
                tx.status.as_deref().unwrap_or("-"),
            );
        }
    }
    Ok(())
}

/// # Errors
/// Returns an error if notifications cannot be fetched or updated.
pub async fn notifications(args: NotificationArgs) -> Result<()> {
    let mut center = NotificationCenter::new(args.api.client()?);
    center.refresh().await?;

    if args.mark_all_read {
        center.mark_all_read().await?;
    }
    for id in &args.mark_read {
        center
            .mark_read(id)
            .await
            .with_context(|| format!("failed to mark notification {id} as read"))?;
    }

    println!("{} unread", center.unread_count());
    for item in center.items() {
        let marker = if item.read { ' ' } else { '*' };
        println!("{marker} [{}] {}: {}", item.id, item.kind, item.message);
    }
    Ok(())
}
