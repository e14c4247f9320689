use clap::{Arg, Command};

pub const ARG_API_BASE_URL: &str = "api-base-url";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout-seconds";
pub const ARG_STATE_DIR: &str = "state-dir";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_BASE_URL)
                .long(ARG_API_BASE_URL)
                .help("Base URL of the commuter REST API, example: https://api.commuter.app")
                .env("COMMUTER_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Timeout for each API request in seconds")
                .env("COMMUTER_REQUEST_TIMEOUT_SECONDS")
                .default_value("10")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long(ARG_STATE_DIR)
                .help("Directory holding the cookie jar and persistent storage")
                .env("COMMUTER_STATE_DIR")
                .default_value(".commuter")
                .global(true),
        )
}
