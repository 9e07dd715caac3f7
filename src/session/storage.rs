//! Storage areas backing the session. Each area holds at most one credential
//! record; the pair is always written and removed as a unit.

use crate::error::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::debug;

/// File name of the persistent record inside the state directory.
pub const SESSION_FILE: &str = "session.json";

/// Token and account identifier, always set and cleared together.
#[derive(Clone, Debug)]
pub struct Credential {
    pub token: SecretString,
    pub account_id: String,
}

impl Credential {
    #[must_use]
    pub fn new(token: SecretString, account_id: impl Into<String>) -> Self {
        Self {
            token,
            account_id: account_id.into(),
        }
    }
}

/// On-disk shape: `{ "token": ..., "accountId": ... }`.
#[derive(Serialize, Deserialize)]
struct Record {
    token: String,
    #[serde(rename = "accountId")]
    account_id: String,
}

/// One key/value area holding a single credential record.
pub trait StorageArea: Send + Sync {
    /// # Errors
    /// Returns `Error::Storage` if the area cannot be read or holds a malformed record.
    fn load(&self) -> Result<Option<Credential>, Error>;

    /// Replaces the record as a whole.
    /// # Errors
    /// Returns `Error::Storage` if the record cannot be written.
    fn store(&self, credential: &Credential) -> Result<(), Error>;

    /// Removes the record; a missing record is not an error.
    /// # Errors
    /// Returns `Error::Storage` if the record exists but cannot be removed.
    fn clear(&self) -> Result<(), Error>;
}

/// Process-lifetime area, gone when the shell exits.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Credential>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryStorage {
    fn load(&self) -> Result<Option<Credential>, Error> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn store(&self, credential: &Credential) -> Result<(), Error> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        *slot = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// JSON file area that survives restarts. Writes go through a temp file in the
/// same directory followed by a rename, so readers see the old or the new
/// record and never half of one.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Area stored as `session.json` under `state_dir`.
    #[must_use]
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(SESSION_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageArea for FileStorage {
    fn load(&self) -> Result<Option<Credential>, Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::Storage(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };

        let record: Record = serde_json::from_str(&raw).map_err(|err| {
            Error::Storage(format!("malformed session record {}: {err}", self.path.display()))
        })?;

        if record.token.is_empty() || record.account_id.is_empty() {
            return Err(Error::Storage(format!(
                "incomplete session record {}",
                self.path.display()
            )));
        }

        Ok(Some(Credential::new(
            SecretString::from(record.token),
            record.account_id,
        )))
    }

    fn store(&self, credential: &Credential) -> Result<(), Error> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let record = Record {
            token: credential.token.expose_secret().to_string(),
            account_id: credential.account_id.clone(),
        };
        let payload = serde_json::to_vec(&record)
            .map_err(|err| Error::Storage(format!("failed to encode session record: {err}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_all()?;
        restrict_permissions(tmp.path())?;
        tmp.persist(&self.path)
            .map_err(|err| Error::Storage(format!("failed to persist session record: {err}")))?;

        debug!(path = %self.path.display(), "session record written");
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Storage(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credential() -> Credential {
        Credential::new(SecretString::from("tok-123"), "a@b.com")
    }

    #[test]
    fn memory_round_trip_and_clear() {
        let area = MemoryStorage::new();
        assert!(area.load().unwrap().is_none());

        area.store(&credential()).unwrap();
        let loaded = area.load().unwrap().unwrap();
        assert_eq!(loaded.token.expose_secret(), "tok-123");
        assert_eq!(loaded.account_id, "a@b.com");

        area.clear().unwrap();
        assert!(area.load().unwrap().is_none());
    }

    #[test]
    fn file_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let area = FileStorage::in_dir(dir.path());
        assert!(area.load().unwrap().is_none());
        // clearing a missing record is fine
        area.clear().unwrap();
    }

    #[test]
    fn file_uses_fixed_keys() {
        let dir = TempDir::new().unwrap();
        let area = FileStorage::in_dir(dir.path());
        area.store(&credential()).unwrap();

        let raw = fs::read_to_string(dir.path().join(SESSION_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["token"], "tok-123");
        assert_eq!(value["accountId"], "a@b.com");
    }

    #[test]
    fn file_creates_missing_state_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("jotpad");
        let area = FileStorage::in_dir(&nested);
        area.store(&credential()).unwrap();
        assert!(area.load().unwrap().is_some());
    }

    #[test]
    fn file_rejects_half_a_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SESSION_FILE);
        fs::write(&path, r#"{"token":"tok-123"}"#).unwrap();
        let area = FileStorage::new(&path);
        assert!(matches!(area.load(), Err(Error::Storage(_))));

        fs::write(&path, r#"{"token":"","accountId":"a@b.com"}"#).unwrap();
        assert!(matches!(area.load(), Err(Error::Storage(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let area = FileStorage::in_dir(dir.path());
        area.store(&credential()).unwrap();
        let mode = fs::metadata(area.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
