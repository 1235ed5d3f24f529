//! Session guard: the persisted bearer credential.
//!
//! The credential lives in a small JSON file under a fixed key
//! (`access_token`). Its presence gates every data operation; absence, or an
//! authorization failure reported by the API gateway, means the user has to
//! log in again. There is no refresh: one rejection ends the session.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key the token is stored under inside the credential file.
pub const TOKEN_KEY: &str = "access_token";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("no home directory to store credentials in")]
    NoStorageLocation,
    #[error("credential store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
}

/// File-backed credential storage.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured location, or fail when no home directory
    /// can be resolved.
    pub fn from_config(config: &crate::config::LifetrackConfig) -> Result<Self, SessionError> {
        config
            .session
            .credentials_path()
            .map(Self::at)
            .ok_or(SessionError::NoStorageLocation)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token, if any. An unreadable or corrupt file counts as
    /// "no token" so the user is sent to log in rather than stuck.
    pub fn token(&self) -> Option<String> {
        match self.read() {
            Ok(file) => file.access_token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable credential store");
                None
            }
        }
    }

    /// Persist `token`, replacing any previous one.
    pub fn save(&self, token: &str) -> Result<(), SessionError> {
        let file = CredentialFile {
            access_token: Some(token.to_string()),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(&file).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| self.io_error(source))
    }

    /// Remove the stored token. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn read(&self) -> Result<CredentialFile, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CredentialFile::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Gate a page or command on a stored credential.
pub fn guard(store: &CredentialStore) -> Result<String, SessionError> {
    store.token().ok_or(SessionError::NotAuthenticated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at(dir.path().join("auth").join("credentials.json"));
        (dir, store)
    }

    #[test]
    fn guard_rejects_missing_credential() {
        let (_dir, store) = temp_store();
        assert!(matches!(guard(&store), Err(SessionError::NotAuthenticated)));
    }

    #[test]
    fn save_then_guard_returns_token() {
        let (_dir, store) = temp_store();
        store.save("abc123").unwrap();
        assert_eq!(guard(&store).unwrap(), "abc123");

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(TOKEN_KEY));
    }

    #[test]
    fn clear_removes_token_and_is_idempotent() {
        let (_dir, store) = temp_store();
        store.save("abc123").unwrap();
        store.clear().unwrap();
        assert!(store.token().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_store_counts_as_logged_out() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(guard(&store), Err(SessionError::NotAuthenticated)));
    }

    #[test]
    fn empty_token_counts_as_logged_out() {
        let (_dir, store) = temp_store();
        store.save("").unwrap();
        assert!(store.token().is_none());
    }
}
