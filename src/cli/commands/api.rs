use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::{env, path::PathBuf, time::Duration};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_TIMEOUT: &str = "timeout";

const DEFAULT_TIMEOUT_SECS: &str = "10";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Base URL of the notes API, e.g. https://api.jotpad.dev")
                .env("JOTPAD_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long("state-dir")
                .help("Directory holding the persisted session")
                .long_help(
                    "Directory holding the persisted session. Defaults to $XDG_CONFIG_HOME/jotpad, or $HOME/.config/jotpad.",
                )
                .env("JOTPAD_STATE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Per-request timeout in seconds")
                .default_value(DEFAULT_TIMEOUT_SECS)
                .env("JOTPAD_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub api_url: Option<String>,
    pub state_dir: PathBuf,
    pub timeout: Duration,
}

impl Options {
    /// # Errors
    /// Returns an error if no state directory was given and none can be derived
    /// from the environment.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let state_dir = match matches.get_one::<PathBuf>(ARG_STATE_DIR) {
            Some(dir) => dir.clone(),
            None => default_state_dir()
                .context("cannot locate a state directory, set --state-dir or JOTPAD_STATE_DIR")?,
        };
        let timeout = matches.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(10);

        Ok(Self {
            api_url: matches.get_one::<String>(ARG_API_URL).cloned(),
            state_dir,
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// `$XDG_CONFIG_HOME/jotpad`, falling back to `$HOME/.config/jotpad`.
#[must_use]
pub fn default_state_dir() -> Option<PathBuf> {
    let non_empty = |key: &str| env::var_os(key).filter(|value| !value.is_empty());

    non_empty("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|base| base.join(env!("CARGO_PKG_NAME")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_dir_prefers_xdg() {
        temp_env::with_vars(
            [
                ("XDG_CONFIG_HOME", Some("/tmp/xdg")),
                ("HOME", Some("/home/ada")),
            ],
            || {
                assert_eq!(default_state_dir(), Some(PathBuf::from("/tmp/xdg/jotpad")));
            },
        );
    }

    #[test]
    fn test_default_state_dir_falls_back_to_home() {
        temp_env::with_vars(
            [("XDG_CONFIG_HOME", Some("")), ("HOME", Some("/home/ada"))],
            || {
                assert_eq!(
                    default_state_dir(),
                    Some(PathBuf::from("/home/ada/.config/jotpad"))
                );
            },
        );
    }

    #[test]
    fn test_default_state_dir_missing() {
        temp_env::with_vars(
            [("XDG_CONFIG_HOME", None::<&str>), ("HOME", None::<&str>)],
            || {
                assert_eq!(default_state_dir(), None);
            },
        );
    }
}
