//! Maps validated CLI matches to the action to run.

use crate::cli::{
    actions::{shell, Action},
    commands::{self, api},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};

/// Map validated CLI matches to an action. Without a subcommand the shell
/// opens at the root route.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let options = api::Options::parse(matches)?;
    let globals = GlobalArgs {
        api_url: options.api_url,
        state_dir: options.state_dir,
        timeout: options.timeout,
    };

    match matches.subcommand() {
        None => shell_action(globals, crate::routes::ROOT),
        Some((commands::CMD_SHELL, sub)) => {
            let path = sub
                .get_one::<String>(commands::ARG_PATH)
                .map_or(crate::routes::ROOT, String::as_str);
            shell_action(globals, path)
        }
        Some((commands::CMD_LOGOUT, _)) => Ok(Action::Logout(globals)),
        Some((commands::CMD_STATUS, _)) => Ok(Action::Status(globals)),
        Some((other, _)) => Err(anyhow!("unknown command: {other}")),
    }
}

fn shell_action(globals: GlobalArgs, path: &str) -> Result<Action> {
    // fail before the shell starts, not at the first request
    let url = globals
        .api_url
        .as_deref()
        .context("missing required argument: --api-url")?;
    url::Url::parse(url).context("invalid JOTPAD_API_URL")?;

    Ok(Action::Shell(shell::Args {
        globals,
        path: path.to_string(),
    }))
}
