pub mod account;
pub mod api;
pub mod gateway;
pub mod logging;
pub mod upgrade;

use clap::{
    ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVE: &str = "serve";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("commuter")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(gateway::with_args(
            Command::new(CMD_SERVE).about("Serve the web app behind the route guard"),
        ))
        .subcommand(account::login())
        .subcommand(account::register())
        .subcommand(account::logout())
        .subcommand(account::whoami())
        .subcommand(account::balance())
        .subcommand(account::notifications())
        .subcommand(upgrade::command());

    let command = api::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrade::Role;
    use std::path::PathBuf;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "commuter");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        command.debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        temp_env::with_vars_unset(
            [
                "COMMUTER_PORT",
                "COMMUTER_LOGIN_PATH",
                "COMMUTER_VERIFY_TOKENS",
                "COMMUTER_PROTECTED_PREFIXES",
            ],
            || {
                let matches = new().get_matches_from(vec!["commuter", "serve"]);
                let serve = matches.subcommand_matches(CMD_SERVE);
                assert_eq!(
                    serve.and_then(|m| m.get_one::<u16>(gateway::ARG_PORT).copied()),
                    Some(8080)
                );
                assert_eq!(
                    serve.and_then(|m| m.get_one::<String>(gateway::ARG_LOGIN_PATH).cloned()),
                    Some("/login".to_string())
                );
                assert_eq!(serve.map(|m| m.get_flag(gateway::ARG_VERIFY_TOKENS)), Some(false));
            },
        );
    }

    #[test]
    fn test_serve_env() {
        temp_env::with_vars(
            [
                ("COMMUTER_PORT", Some("9090")),
                ("COMMUTER_PROTECTED_PREFIXES", Some("/wallet,/admin")),
                ("COMMUTER_VERIFY_TOKENS", Some("true")),
            ],
            || {
                let matches = new().get_matches_from(vec!["commuter", "serve"]);
                let serve = matches.subcommand_matches(CMD_SERVE);
                assert_eq!(
                    serve.and_then(|m| m.get_one::<u16>(gateway::ARG_PORT).copied()),
                    Some(9090)
                );
                let prefixes: Vec<String> = serve
                    .and_then(|m| m.get_many::<String>(gateway::ARG_PROTECTED_PREFIX))
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default();
                assert_eq!(prefixes, vec!["/wallet".to_string(), "/admin".to_string()]);
                assert_eq!(serve.map(|m| m.get_flag(gateway::ARG_VERIFY_TOKENS)), Some(true));
            },
        );
    }

    #[test]
    fn test_global_api_args() {
        temp_env::with_vars(
            [
                ("COMMUTER_API_BASE_URL", Some("https://api.commuter.test")),
                ("COMMUTER_STATE_DIR", None::<&str>),
            ],
            || {
                let matches = new().get_matches_from(vec!["commuter", "whoami"]);
                let whoami = matches.subcommand_matches("whoami");
                assert_eq!(
                    whoami.and_then(|m| m.get_one::<String>(api::ARG_API_BASE_URL).cloned()),
                    Some("https://api.commuter.test".to_string())
                );
                assert_eq!(
                    whoami.and_then(|m| m.get_one::<String>(api::ARG_STATE_DIR).cloned()),
                    Some(".commuter".to_string())
                );
            },
        );
    }

    #[test]
    fn test_login_rejects_bad_email() {
        temp_env::with_var_unset("COMMUTER_EMAIL", || {
            let result =
                new().try_get_matches_from(vec!["commuter", "login", "--email", "not-an-email"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_upgrade_args() {
        let matches = new().get_matches_from(vec![
            "commuter",
            "upgrade",
            "driver",
            "--text",
            "license_number=DL-42",
            "--file",
            "license_document=/tmp/license.pdf",
            "--selfie",
            "/tmp/me.jpg",
            "--wait",
        ]);
        let upgrade = matches.subcommand_matches("upgrade");
        assert_eq!(
            upgrade.and_then(|m| m.get_one::<Role>(upgrade::ARG_ROLE).copied()),
            Some(Role::Driver)
        );
        assert_eq!(
            upgrade
                .and_then(|m| m.get_many::<(String, String)>(upgrade::ARG_TEXT))
                .map(|values| values.cloned().collect::<Vec<_>>()),
            Some(vec![("license_number".to_string(), "DL-42".to_string())])
        );
        assert_eq!(
            upgrade
                .and_then(|m| m.get_many::<(String, PathBuf)>(upgrade::ARG_FILE))
                .map(|values| values.cloned().collect::<Vec<_>>()),
            Some(vec![(
                "license_document".to_string(),
                PathBuf::from("/tmp/license.pdf")
            )])
        );
        assert_eq!(upgrade.map(|m| m.get_flag(upgrade::ARG_WAIT)), Some(true));
    }

    #[test]
    fn test_verbosity_count() {
        temp_env::with_var_unset("COMMUTER_LOG_LEVEL", || {
            let matches = new().get_matches_from(vec!["commuter", "logout", "-vvv"]);
            assert_eq!(matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(3));
        });
    }

    #[test]
    fn test_upgrade_rejects_unknown_role_and_bad_pairs() {
        assert!(new().try_get_matches_from(vec!["commuter", "upgrade", "pilot"]).is_err());
        assert!(
            new()
                .try_get_matches_from(vec!["commuter", "upgrade", "driver", "--text", "novalue"])
                .is_err()
        );
    }
}
