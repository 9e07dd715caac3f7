//! Protected view controller. Entering the dashboard fetches the profile and
//! the notes once; any authorization failure from here on drops the session
//! and sends the user back to `/login`.
//!
//! In-flight requests belong to the futures returned by these methods, so
//! leaving the view (dropping the future) discards their responses.

use crate::{
    api::ApiClient,
    error::Error,
    notes::{Confirmation, DeleteOutcome, Note, NotesClient},
    profile::{Profile, ProfileFetcher},
    session::{self, SessionStore},
};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, PartialEq, Eq)]
pub enum DashboardError {
    /// The session is gone; navigate to the given route.
    Redirect(&'static str),
    /// Show the error and stay on the dashboard.
    Failed(Error),
}

/// What `enter` could load. Either part may have failed independently.
#[derive(Debug, Default)]
pub struct EntryReport {
    pub profile_error: Option<Error>,
    pub notes_error: Option<Error>,
}

pub struct Dashboard {
    session: Arc<SessionStore>,
    profile_fetcher: ProfileFetcher,
    notes: NotesClient,
    profile: Option<Profile>,
}

impl Dashboard {
    #[must_use]
    pub fn new(api: ApiClient, session: Arc<SessionStore>) -> Self {
        Self {
            profile_fetcher: ProfileFetcher::new(api.clone(), session.clone()),
            notes: NotesClient::new(api, session.clone()),
            session,
            profile: None,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        self.notes.notes()
    }

    /// Account shown when the profile could not be loaded.
    #[must_use]
    pub fn account_label(&self) -> String {
        self.session
            .current_account_id()
            .unwrap_or_else(|| "User".to_string())
    }

    /// Loads profile and notes concurrently. Called once per entry into the view.
    ///
    /// # Errors
    /// `Redirect("/login")` if either call reports the session invalid.
    pub async fn enter(&mut self) -> Result<EntryReport, DashboardError> {
        if !self.session.is_present() {
            return Err(DashboardError::Redirect(session::logout(&self.session)));
        }

        let (profile, notes) = tokio::join!(
            self.profile_fetcher.fetch_profile(),
            self.notes.list_notes()
        );
        let notes = notes.map(|_| ());

        if matches!(profile, Err(Error::SessionInvalid))
            || matches!(notes, Err(Error::SessionInvalid))
        {
            return Err(self.expire());
        }

        let mut report = EntryReport::default();
        match profile {
            Ok(profile) => self.profile = Some(profile),
            Err(err) => {
                error!("failed to fetch profile: {err}");
                report.profile_error = Some(err);
            }
        }
        if let Err(err) = notes {
            error!("failed to fetch notes: {err}");
            report.notes_error = Some(err);
        }
        Ok(report)
    }

    /// # Errors
    /// `Redirect("/login")` on an invalid session, `Failed` otherwise.
    pub async fn add_note(&mut self, content: &str) -> Result<Note, DashboardError> {
        let created = self.notes.create_note(content).await.map(Note::clone);
        created.map_err(|err| self.escalate(err))
    }

    /// # Errors
    /// `Redirect("/login")` on an invalid session, `Failed` otherwise.
    pub async fn delete_note(
        &mut self,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, DashboardError> {
        let outcome = self.notes.delete_note(id, confirmation).await;
        outcome.map_err(|err| self.escalate(err))
    }

    fn escalate(&self, err: Error) -> DashboardError {
        if err.is_session_invalid() {
            self.expire()
        } else {
            DashboardError::Failed(err)
        }
    }

    fn expire(&self) -> DashboardError {
        warn!("session rejected by the API, signing out");
        DashboardError::Redirect(session::logout(&self.session))
    }
}
