use clap::{Arg, ArgAction, Command, builder::ValueParser};
use once_cell::sync::Lazy;
use regex::Regex;

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_REMEMBER_ME: &str = "remember-me";
pub const ARG_FULL_NAME: &str = "full-name";
pub const ARG_PHONE: &str = "phone";
pub const ARG_HISTORY: &str = "history";
pub const ARG_MARK_READ: &str = "mark-read";
pub const ARG_MARK_ALL_READ: &str = "mark-all-read";

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Accepts a trimmed address with one `@` and a dotted domain.
#[must_use]
pub fn validator_email() -> ValueParser {
    ValueParser::from(move |email: &str| -> std::result::Result<String, String> {
        let email = email.trim();
        if EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email)) {
            Ok(email.to_string())
        } else {
            Err("invalid email address".to_string())
        }
    })
}

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Account email")
        .env("COMMUTER_EMAIL")
        .value_parser(validator_email())
}

fn password_arg() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("Account password; read from stdin when omitted")
        .env("COMMUTER_PASSWORD")
        .hide_env_values(true)
}

#[must_use]
pub fn login() -> Command {
    Command::new("login")
        .about("Log in and store the session tokens")
        .arg(email_arg().required(true))
        .arg(password_arg())
        .arg(
            Arg::new(ARG_REMEMBER_ME)
                .long(ARG_REMEMBER_ME)
                .help("Remember the email for the next login")
                .action(ArgAction::SetTrue),
        )
}

#[must_use]
pub fn register() -> Command {
    Command::new("register")
        .about("Create an account (does not log in)")
        .arg(
            Arg::new(ARG_FULL_NAME)
                .long(ARG_FULL_NAME)
                .help("Full name")
                .required(true),
        )
        .arg(email_arg().required(true))
        .arg(Arg::new(ARG_PHONE).long(ARG_PHONE).help("Phone number"))
        .arg(password_arg())
}

#[must_use]
pub fn logout() -> Command {
    Command::new("logout").about("Log out and clear the stored session")
}

#[must_use]
pub fn whoami() -> Command {
    Command::new("whoami").about("Restore the stored session and show the signed-in user")
}

#[must_use]
pub fn balance() -> Command {
    Command::new("balance").about("Show the wallet balance").arg(
        Arg::new(ARG_HISTORY)
            .long(ARG_HISTORY)
            .help("Also list wallet transactions")
            .action(ArgAction::SetTrue),
    )
}

#[must_use]
pub fn notifications() -> Command {
    Command::new("notifications")
        .about("List notifications")
        .arg(
            Arg::new(ARG_MARK_READ)
                .long(ARG_MARK_READ)
                .help("Mark the notification with this id as read")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_MARK_ALL_READ)
                .long(ARG_MARK_ALL_READ)
                .help("Mark every notification as read")
                .action(ArgAction::SetTrue)
                .conflicts_with(ARG_MARK_READ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_email() {
        let command = Command::new("t").arg(Arg::new("email").value_parser(validator_email()));
        let matches = command
            .clone()
            .try_get_matches_from(["t", " ada@example.com "]);
        assert_eq!(
            matches
                .ok()
                .and_then(|m| m.get_one::<String>("email").cloned()),
            Some("ada@example.com".to_string())
        );

        for bad in ["ada", "ada@", "@example.com", "a b@example.com", "ada@example"] {
            assert!(
                command.clone().try_get_matches_from(["t", bad]).is_err(),
                "{bad} should be rejected"
            );
        }
    }
}
