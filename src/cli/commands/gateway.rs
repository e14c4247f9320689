use crate::guard::DEFAULT_LOGIN_PATH;
use clap::{Arg, ArgAction, Command};

pub const ARG_PORT: &str = "port";
pub const ARG_STATIC_DIR: &str = "static-dir";
pub const ARG_PROTECTED_PREFIX: &str = "protected-prefix";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_VERIFY_TOKENS: &str = "verify-tokens";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";
pub const ARG_COOKIE_MAX_AGE: &str = "cookie-max-age-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("COMMUTER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_STATIC_DIR)
                .long(ARG_STATIC_DIR)
                .help("Directory with the built web app; index.html answers unknown paths")
                .env("COMMUTER_STATIC_DIR"),
        )
        .arg(
            Arg::new(ARG_PROTECTED_PREFIX)
                .long(ARG_PROTECTED_PREFIX)
                .help("Path prefix that requires a session, repeatable (default: dashboard, wallet, trips, ...)")
                .env("COMMUTER_PROTECTED_PREFIXES")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long(ARG_LOGIN_PATH)
                .help("Login page unauthenticated visitors are sent to")
                .env("COMMUTER_LOGIN_PATH")
                .default_value(DEFAULT_LOGIN_PATH),
        )
        .arg(
            Arg::new(ARG_VERIFY_TOKENS)
                .long(ARG_VERIFY_TOKENS)
                .help("Verify access tokens against the API and refresh invalid ones")
                .env("COMMUTER_VERIFY_TOKENS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark refreshed token cookies as Secure")
                .env("COMMUTER_SECURE_COOKIES")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE)
                .long(ARG_COOKIE_MAX_AGE)
                .help("Lifetime of refreshed cookies when the token has no exp claim (default: 7 days)")
                .env("COMMUTER_COOKIE_MAX_AGE_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
}
