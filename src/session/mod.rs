//! Session ownership for the client. `SessionStore` is the only place that
//! knows about the two storage lifetimes; everything else asks it for the
//! current token at call time and never keeps its own copy.

pub mod storage;

use crate::{error::Error, routes};
use secrecy::SecretString;
use std::{fmt, path::Path};
use tracing::{info, warn};

pub use self::storage::{Credential, FileStorage, MemoryStorage, StorageArea};

/// Which storage area holds the credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// Lives only as long as the current shell process.
    Ephemeral,
    /// Survives restarts.
    Persistent,
}

impl Lifetime {
    /// Maps the "keep me logged in" choice to a lifetime.
    #[must_use]
    pub const fn from_keep_logged_in(keep: bool) -> Self {
        if keep {
            Self::Persistent
        } else {
            Self::Ephemeral
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => f.write_str("ephemeral"),
            Self::Persistent => f.write_str("persistent"),
        }
    }
}

pub struct SessionStore {
    persistent: Box<dyn StorageArea>,
    ephemeral: Box<dyn StorageArea>,
}

impl SessionStore {
    #[must_use]
    pub fn new(persistent: Box<dyn StorageArea>, ephemeral: Box<dyn StorageArea>) -> Self {
        Self {
            persistent,
            ephemeral,
        }
    }

    /// Persistent area in `state_dir`, ephemeral area in process memory.
    #[must_use]
    pub fn open(state_dir: &Path) -> Self {
        Self::new(
            Box::new(FileStorage::in_dir(state_dir)),
            Box::new(MemoryStorage::new()),
        )
    }

    /// Both areas in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()), Box::new(MemoryStorage::new()))
    }

    fn area(&self, lifetime: Lifetime) -> &dyn StorageArea {
        match lifetime {
            Lifetime::Persistent => self.persistent.as_ref(),
            Lifetime::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    /// Writes the credential pair into the area selected by `lifetime`, then
    /// empties the other area.
    ///
    /// # Errors
    /// Returns `Error::Storage` if the selected area cannot be written or the
    /// other area cannot be emptied. In the latter case the new record is
    /// removed again, so reads never mix the two credentials.
    pub fn persist_session(
        &self,
        token: SecretString,
        account_id: &str,
        lifetime: Lifetime,
    ) -> Result<(), Error> {
        let credential = Credential::new(token, account_id);
        self.area(lifetime).store(&credential)?;

        let other = match lifetime {
            Lifetime::Persistent => Lifetime::Ephemeral,
            Lifetime::Ephemeral => Lifetime::Persistent,
        };
        if let Err(err) = self.area(other).clear() {
            warn!("failed to clear {other} session area, discarding the new session: {err}");
            if let Err(rollback) = self.area(lifetime).clear() {
                warn!("failed to discard the new {lifetime} session: {rollback}");
            }
            return Err(err);
        }

        info!(%lifetime, "session persisted");
        Ok(())
    }

    /// Credential and the lifetime holding it; persistent wins when both are set.
    #[must_use]
    pub fn current(&self) -> Option<(Credential, Lifetime)> {
        [Lifetime::Persistent, Lifetime::Ephemeral]
            .into_iter()
            .find_map(|lifetime| match self.area(lifetime).load() {
                Ok(credential) => credential.map(|credential| (credential, lifetime)),
                Err(err) => {
                    warn!("ignoring unreadable {lifetime} session: {err}");
                    None
                }
            })
    }

    #[must_use]
    pub fn current_token(&self) -> Option<SecretString> {
        self.current().map(|(credential, _)| credential.token)
    }

    #[must_use]
    pub fn current_account_id(&self) -> Option<String> {
        self.current().map(|(credential, _)| credential.account_id)
    }

    #[must_use]
    pub fn current_lifetime(&self) -> Option<Lifetime> {
        self.current().map(|(_, lifetime)| lifetime)
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.current().is_some()
    }

    /// Removes the credential from both areas, whichever one was used at login.
    ///
    /// # Errors
    /// Returns the first `Error::Storage` encountered; both areas are always attempted.
    pub fn clear_session(&self) -> Result<(), Error> {
        let persistent = self.persistent.clear();
        let ephemeral = self.ephemeral.clear();
        info!("session cleared");
        persistent.and(ephemeral)
    }
}

/// Runs logout: clears the session regardless of its state and returns the
/// route to show next.
#[must_use]
pub fn logout(store: &SessionStore) -> &'static str {
    if let Err(err) = store.clear_session() {
        warn!("logout left residual session data: {err}");
    }
    routes::LOGIN
}
