use crate::{
    cli::globals::GlobalArgs,
    schedule::TokioScheduler,
    shell::{Console, Shell},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    /// Route the shell navigates to first.
    pub path: String,
}

/// Execute the interactive shell on stdin/stdout.
/// # Errors
/// Returns an error if the API URL is unusable or the terminal cannot be read or written.
pub async fn execute(args: Args) -> Result<()> {
    let api = args.globals.api_client()?;
    info!(api = %api.base_url(), "starting shell");
    debug!(state_dir = %args.globals.state_dir.display(), timeout = ?args.globals.timeout);

    let session = Arc::new(args.globals.session_store());
    let mut shell = Shell::new(Console::stdio(), api, session, Arc::new(TokioScheduler));
    shell
        .run(&args.path)
        .await
        .context("terminal input/output failed")
}
