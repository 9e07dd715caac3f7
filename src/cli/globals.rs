use crate::{api::ApiClient, session::SessionStore};
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Settings shared by every subcommand.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub state_dir: PathBuf,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            api_url: None,
            state_dir,
            timeout: crate::api::DEFAULT_TIMEOUT,
        }
    }

    /// Session store rooted at `state_dir`.
    #[must_use]
    pub fn session_store(&self) -> SessionStore {
        SessionStore::open(&self.state_dir)
    }

    /// # Errors
    /// Returns an error if no API URL was configured or it is not a usable base URL.
    pub fn api_client(&self) -> Result<ApiClient> {
        let url = self
            .api_url
            .as_deref()
            .context("missing required argument: --api-url")?;
        ApiClient::new(url, self.timeout).context("invalid JOTPAD_API_URL")
    }
}
