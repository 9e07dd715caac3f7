//! Client for the current-user endpoint.

use crate::{api::ApiClient, error::Error, session::SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "name")]
    pub display_name: String,
    pub email: String,
}

pub struct ProfileFetcher {
    api: ApiClient,
    session: Arc<SessionStore>,
}

impl ProfileFetcher {
    #[must_use]
    pub fn new(api: ApiClient, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    /// `SessionInvalid` on `401` or without a session; transport/HTTP errors otherwise.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Profile, Error> {
        let token = self.session.current_token().ok_or(Error::SessionInvalid)?;
        self.api.get_json(&["me"], &token).await
    }
}
