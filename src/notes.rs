//! Client for the notes resource. The local list only changes after the
//! server confirms a write, so a failed call never needs a rollback.

use crate::{api::ApiClient, error::Error, session::SessionStore};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const NOTES: &str = "notes";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Document stores hand the id back as `_id`.
    #[serde(alias = "_id")]
    pub id: String,
    pub content: String,
}

#[derive(Serialize)]
struct CreateNoteRequest<'a> {
    content: &'a str,
}

/// The user's answer to "Are you sure you want to delete this note?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    #[must_use]
    pub const fn from_answer(yes: bool) -> Self {
        if yes {
            Self::Confirmed
        } else {
            Self::Declined
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Note),
    /// Confirmed and accepted by the server, but not in the local list.
    DeletedRemote,
    Cancelled,
}

pub struct NotesClient {
    api: ApiClient,
    session: Arc<SessionStore>,
    notes: Vec<Note>,
}

impl NotesClient {
    #[must_use]
    pub fn new(api: ApiClient, session: Arc<SessionStore>) -> Self {
        Self {
            api,
            session,
            notes: Vec::new(),
        }
    }

    /// Local mirror of the server list, in server order.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Reads the token now; a missing session fails before any request.
    fn token(&self) -> Result<SecretString, Error> {
        self.session.current_token().ok_or(Error::SessionInvalid)
    }

    /// Replaces the local list with the server's.
    ///
    /// # Errors
    /// `SessionInvalid` on `401` or without a session; transport/HTTP errors otherwise.
    #[instrument(skip(self))]
    pub async fn list_notes(&mut self) -> Result<&[Note], Error> {
        let token = self.token()?;
        let notes: Vec<Note> = self.api.get_json(&[NOTES], &token).await?;
        debug!(count = notes.len(), "notes fetched");
        self.notes = notes;
        Ok(&self.notes)
    }

    /// Creates a note and appends the server's copy at the tail. An id that is
    /// already listed keeps its existing entry.
    ///
    /// # Errors
    /// `Validation` for blank content (no request is sent), `SessionInvalid`,
    /// or transport/HTTP errors. The local list is unchanged on error.
    #[instrument(skip(self, content))]
    pub async fn create_note(&mut self, content: &str) -> Result<&Note, Error> {
        if content.trim().is_empty() {
            return Err(Error::Validation("Note content cannot be empty".to_string()));
        }
        let token = self.token()?;

        let note: Note = self
            .api
            .post_json(&[NOTES], &CreateNoteRequest { content }, Some(&token))
            .await?;

        let index = if let Some(index) = self.notes.iter().position(|n| n.id == note.id) {
            warn!(id = %note.id, "server returned an id already in the list, keeping it");
            index
        } else {
            self.notes.push(note);
            self.notes.len() - 1
        };

        info!("note created");
        Ok(&self.notes[index])
    }

    /// Deletes note `id` once the user has confirmed.
    ///
    /// # Errors
    /// `SessionInvalid` or transport/HTTP errors; the local list is unchanged on error.
    #[instrument(skip(self))]
    pub async fn delete_note(
        &mut self,
        id: &str,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, Error> {
        if confirmation == Confirmation::Declined {
            debug!("delete cancelled by user");
            return Ok(DeleteOutcome::Cancelled);
        }
        let token = self.token()?;

        self.api.delete(&[NOTES, id], &token).await?;

        info!("note deleted");
        Ok(match self.notes.iter().position(|note| note.id == id) {
            Some(index) => DeleteOutcome::Deleted(self.notes.remove(index)),
            None => DeleteOutcome::DeletedRemote,
        })
    }
}
