use crate::upgrade::Role;
use clap::{Arg, ArgAction, Command, builder::ValueParser};
use std::{path::PathBuf, str::FromStr};

pub const ARG_ROLE: &str = "role";
pub const ARG_TEXT: &str = "text";
pub const ARG_FILE: &str = "file";
pub const ARG_SELFIE: &str = "selfie";
pub const ARG_WAIT: &str = "wait";
pub const ARG_POLL_INTERVAL: &str = "poll-interval-seconds";

#[must_use]
pub fn validator_role() -> ValueParser {
    ValueParser::from(move |role: &str| -> std::result::Result<Role, String> {
        Role::from_str(role).map_err(|err| err.to_string())
    })
}

/// `field=value` with a non-empty field name.
#[must_use]
pub fn validator_field_value() -> ValueParser {
    ValueParser::from(
        move |pair: &str| -> std::result::Result<(String, String), String> {
            match pair.split_once('=') {
                Some((field, value)) if !field.trim().is_empty() => {
                    Ok((field.trim().to_string(), value.to_string()))
                }
                _ => Err("expected field=value".to_string()),
            }
        },
    )
}

/// `field=path`.
#[must_use]
pub fn validator_field_path() -> ValueParser {
    ValueParser::from(
        move |pair: &str| -> std::result::Result<(String, PathBuf), String> {
            match pair.split_once('=') {
                Some((field, path)) if !field.trim().is_empty() && !path.trim().is_empty() => {
                    Ok((field.trim().to_string(), PathBuf::from(path.trim())))
                }
                _ => Err("expected field=path".to_string()),
            }
        },
    )
}

#[must_use]
pub fn command() -> Command {
    Command::new("upgrade")
        .about("Apply for a role upgrade and optionally wait for verification")
        .arg(
            Arg::new(ARG_ROLE)
                .help("Role to apply for: driver, conductor, station_manager, contributor")
                .required(true)
                .value_parser(validator_role()),
        )
        .arg(
            Arg::new(ARG_TEXT)
                .short('t')
                .long(ARG_TEXT)
                .help("Text field as field=value, repeatable")
                .action(ArgAction::Append)
                .value_parser(validator_field_value()),
        )
        .arg(
            Arg::new(ARG_FILE)
                .short('f')
                .long(ARG_FILE)
                .help("Document as field=path, repeatable")
                .action(ArgAction::Append)
                .value_parser(validator_field_path()),
        )
        .arg(
            Arg::new(ARG_SELFIE)
                .long(ARG_SELFIE)
                .help("Image captured as the selfie")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_WAIT)
                .short('w')
                .long(ARG_WAIT)
                .help("Poll the verification status until it is final")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_POLL_INTERVAL)
                .long(ARG_POLL_INTERVAL)
                .help("Seconds between verification status checks (default: 10)")
                .env("COMMUTER_POLL_INTERVAL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
}
