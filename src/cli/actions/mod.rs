pub mod logout;
pub mod shell;
pub mod status;

// The match over `Action` lives in `run` so this module only declares the variants.
mod run;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Shell(shell::Args),
    Logout(GlobalArgs),
    Status(GlobalArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
