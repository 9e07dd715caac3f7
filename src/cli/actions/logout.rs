use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use std::io::Write;

/// Clears the stored session without contacting the API.
/// # Errors
/// Returns an error if the session file cannot be removed.
pub fn execute(globals: &GlobalArgs, out: &mut impl Write) -> Result<()> {
    globals
        .session_store()
        .clear_session()
        .context("failed to clear the stored session")?;
    writeln!(out, "You have been logged out!")?;
    Ok(())
}
