use crate::{
    cli::{
        actions::{Action, ApiArgs, account, serve, upgrade},
        commands::{self, account as account_args, api, gateway, upgrade as upgrade_args},
    },
    guard::GuardConfig,
    upgrade::Role,
};
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

fn api_args(matches: &ArgMatches) -> ApiArgs {
    ApiArgs {
        api_base_url: matches
            .get_one::<String>(api::ARG_API_BASE_URL)
            .cloned()
            .unwrap_or_default(),
        request_timeout_seconds: matches
            .get_one::<u64>(api::ARG_REQUEST_TIMEOUT)
            .copied()
            .unwrap_or(crate::config::DEFAULT_TIMEOUT_SECONDS),
        state_dir: matches
            .get_one::<String>(api::ARG_STATE_DIR)
            .map_or_else(|| PathBuf::from(".commuter"), PathBuf::from),
    }
}

fn password(matches: &ArgMatches) -> Option<SecretString> {
    matches
        .get_one::<String>(account_args::ARG_PASSWORD)
        .cloned()
        .map(SecretString::from)
}

fn email(matches: &ArgMatches) -> Result<String> {
    matches
        .get_one::<String>(account_args::ARG_EMAIL)
        .cloned()
        .context("missing required argument: --email")
}

fn guard_config(matches: &ArgMatches) -> GuardConfig {
    let mut config = GuardConfig::new()
        .with_verify_tokens(matches.get_flag(gateway::ARG_VERIFY_TOKENS))
        .with_secure_cookies(matches.get_flag(gateway::ARG_SECURE_COOKIES));

    if let Some(prefixes) = matches.get_many::<String>(gateway::ARG_PROTECTED_PREFIX) {
        config = config.with_protected_prefixes(prefixes.cloned());
    }
    if let Some(login_path) = matches.get_one::<String>(gateway::ARG_LOGIN_PATH) {
        config = config.with_login_path(login_path.clone());
    }
    if let Some(max_age) = matches.get_one::<u64>(gateway::ARG_COOKIE_MAX_AGE) {
        config = config.with_cookie_max_age_seconds(*max_age);
    }

    config.normalize()
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing subcommand, see --help");
    };

    let action = match name {
        commands::CMD_SERVE => Action::Serve(serve::Args {
            port: sub.get_one::<u16>(gateway::ARG_PORT).copied().unwrap_or(8080),
            static_dir: sub.get_one::<String>(gateway::ARG_STATIC_DIR).map(PathBuf::from),
            guard: guard_config(sub),
            api: api_args(sub),
        }),
        "login" => Action::Login(account::LoginArgs {
            api: api_args(sub),
            email: email(sub)?,
            password: password(sub),
            remember_me: sub.get_flag(account_args::ARG_REMEMBER_ME),
        }),
        "register" => Action::Register(account::RegisterArgs {
            api: api_args(sub),
            full_name: sub
                .get_one::<String>(account_args::ARG_FULL_NAME)
                .cloned()
                .context("missing required argument: --full-name")?,
            email: email(sub)?,
            phone: sub.get_one::<String>(account_args::ARG_PHONE).cloned(),
            password: password(sub),
        }),
        "logout" => Action::Logout(api_args(sub)),
        "whoami" => Action::Whoami(api_args(sub)),
        "balance" => Action::Balance(account::BalanceArgs {
            api: api_args(sub),
            history: sub.get_flag(account_args::ARG_HISTORY),
        }),
        "notifications" => Action::Notifications(account::NotificationArgs {
            api: api_args(sub),
            mark_read: sub
                .get_many::<String>(account_args::ARG_MARK_READ)
                .map(|ids| ids.cloned().collect())
                .unwrap_or_default(),
            mark_all_read: sub.get_flag(account_args::ARG_MARK_ALL_READ),
        }),
        "upgrade" => Action::Upgrade(upgrade::Args {
            api: api_args(sub),
            role: sub
                .get_one::<Role>(upgrade_args::ARG_ROLE)
                .copied()
                .context("missing required argument: <role>")?,
            texts: sub
                .get_many::<(String, String)>(upgrade_args::ARG_TEXT)
                .map(|pairs| pairs.cloned().collect())
                .unwrap_or_default(),
            files: sub
                .get_many::<(String, PathBuf)>(upgrade_args::ARG_FILE)
                .map(|pairs| pairs.cloned().collect())
                .unwrap_or_default(),
            selfie: sub.get_one::<PathBuf>(upgrade_args::ARG_SELFIE).cloned(),
            wait: sub.get_flag(upgrade_args::ARG_WAIT),
            poll_interval_seconds: sub
                .get_one::<u64>(upgrade_args::ARG_POLL_INTERVAL)
                .copied()
                .unwrap_or(crate::upgrade::DEFAULT_POLL_INTERVAL_SECONDS),
        }),
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn parse(args: &[&str]) -> Result<Action> {
        let matches = commands::new().try_get_matches_from(args)?;
        handler(&matches)
    }

    #[test]
    fn test_serve_action() -> Result<()> {
        temp_env::with_vars_unset(
            [
                "COMMUTER_PORT",
                "COMMUTER_PROTECTED_PREFIXES",
                "COMMUTER_LOGIN_PATH",
                "COMMUTER_VERIFY_TOKENS",
                "COMMUTER_STATIC_DIR",
                "COMMUTER_COOKIE_MAX_AGE_SECONDS",
            ],
            || {
                let action = parse(&[
                    "commuter",
                    "serve",
                    "--port",
                    "3000",
                    "--protected-prefix",
                    "admin/",
                    "--login-path",
                    "/signin",
                    "--static-dir",
                    "dist",
                ])?;
                let Action::Serve(args) = action else {
                    bail!("expected serve action");
                };
                assert_eq!(args.port, 3000);
                assert_eq!(args.static_dir, Some(PathBuf::from("dist")));
                assert_eq!(args.guard.protected_prefixes(), ["/admin".to_string()]);
                assert_eq!(args.guard.login_path(), "/signin");
                assert!(!args.guard.verify_tokens());
                assert_eq!(
                    args.guard.cookie_max_age_seconds(),
                    crate::guard::DEFAULT_COOKIE_MAX_AGE_SECONDS
                );
                Ok(())
            },
        )
    }

    #[test]
    fn test_login_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("COMMUTER_PASSWORD", Some("hunter2")),
                ("COMMUTER_API_BASE_URL", Some("https://api.commuter.test")),
                ("COMMUTER_STATE_DIR", Some("/tmp/commuter-state")),
                ("COMMUTER_EMAIL", None),
            ],
            || {
                let action = parse(&[
                    "commuter",
                    "login",
                    "--email",
                    "ada@example.com",
                    "--remember-me",
                ])?;
                let Action::Login(args) = action else {
                    bail!("expected login action");
                };
                assert_eq!(args.email, "ada@example.com");
                assert!(args.remember_me);
                assert_eq!(
                    args.password.as_ref().map(|p| p.expose_secret().to_string()),
                    Some("hunter2".to_string())
                );
                assert_eq!(args.api.api_base_url, "https://api.commuter.test");
                assert_eq!(args.api.state_dir, PathBuf::from("/tmp/commuter-state"));
                Ok(())
            },
        )
    }

    #[test]
    fn test_upgrade_action() -> Result<()> {
        temp_env::with_var_unset("COMMUTER_POLL_INTERVAL_SECONDS", || {
            let action = parse(&[
                "commuter",
                "upgrade",
                "station-manager",
                "-t",
                "station_id=12",
                "-f",
                "id_document=id.pdf",
            ])?;
            let Action::Upgrade(args) = action else {
                bail!("expected upgrade action");
            };
            assert_eq!(args.role, Role::StationManager);
            assert_eq!(args.texts, vec![("station_id".to_string(), "12".to_string())]);
            assert_eq!(
                args.files,
                vec![("id_document".to_string(), PathBuf::from("id.pdf"))]
            );
            assert!(!args.wait);
            assert_eq!(args.poll_interval_seconds, 10);
            Ok(())
        })
    }

    #[test]
    fn test_cookie_max_age_and_poll_interval_overrides() -> Result<()> {
        temp_env::with_vars(
            [
                ("COMMUTER_COOKIE_MAX_AGE_SECONDS", Some("3600")),
                ("COMMUTER_POLL_INTERVAL_SECONDS", Some("30")),
            ],
            || {
                let Action::Serve(serve) = parse(&["commuter", "serve"])? else {
                    bail!("expected serve action");
                };
                assert_eq!(serve.guard.cookie_max_age_seconds(), 3600);

                let Action::Upgrade(upgrade) = parse(&["commuter", "upgrade", "contributor"])?
                else {
                    bail!("expected upgrade action");
                };
                assert_eq!(upgrade.poll_interval_seconds, 30);
                Ok(())
            },
        )
    }

    #[test]
    fn test_notifications_action() -> Result<()> {
        let action = parse(&["commuter", "notifications", "--mark-read", "4", "--mark-read", "9"])?;
        let Action::Notifications(args) = action else {
            bail!("expected notifications action");
        };
        assert_eq!(args.mark_read, vec!["4".to_string(), "9".to_string()]);
        assert!(!args.mark_all_read);
        Ok(())
    }
}
