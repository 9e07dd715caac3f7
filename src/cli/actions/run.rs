use crate::cli::actions::{logout, shell, status, Action};
use anyhow::Result;
use std::io;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Shell(args) => shell::execute(args).await,
        Action::Logout(globals) => logout::execute(&globals, &mut io::stdout()),
        Action::Status(globals) => status::execute(&globals, &mut io::stdout()),
    }
}
