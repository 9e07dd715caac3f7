use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use std::io::Write;

/// Reports whether a session is stored. The token is never printed.
/// # Errors
/// Returns an error if the output cannot be written.
pub fn execute(globals: &GlobalArgs, out: &mut impl Write) -> Result<()> {
    match globals.session_store().current() {
        Some((credential, lifetime)) => {
            writeln!(out, "Signed in as {} ({lifetime})", credential.account_id)?;
        }
        None => writeln!(out, "Not signed in")?,
    }
    writeln!(out, "State directory: {}", globals.state_dir.display())?;
    Ok(())
}
