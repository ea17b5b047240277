use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Invalid credentials: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plaintext `username,password` file. Registration appends, login scans.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a new user. Names are unique; neither field may hold a comma or line break.
    pub fn register(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        validate_field("username", username)?;
        validate_field("password", password)?;

        if self.lookup(username)?.is_some() {
            warn!("Registration refused, user {} already exists", username);
            return Err(CredentialError::UserExists(username.to_string()));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{},{}", username, password)?;

        info!("Registered user {}", username);
        Ok(())
    }

    /// Check a username/password pair against the file
    pub fn verify(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let matched = self
            .lookup(username)?
            .is_some_and(|stored| stored == password);
        if !matched {
            warn!("Failed login for {}", username);
        }
        Ok(matched)
    }

    /// Password stored for `username`, if any. A missing file holds no users.
    fn lookup(&self, username: &str) -> Result<Option<String>, CredentialError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(contents.lines().find_map(|line| {
            let (name, password) = line.split_once(',')?;
            (name == username).then(|| password.to_string())
        }))
    }
}

fn validate_field(field: &str, value: &str) -> Result<(), CredentialError> {
    if value.is_empty() {
        return Err(CredentialError::Invalid(format!("{} must not be empty", field)));
    }
    if value.contains([',', '\n', '\r']) {
        return Err(CredentialError::Invalid(format!(
            "{} must not contain commas or line breaks",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("users.txt"));
        (dir, store)
    }

    #[test]
    fn test_register_then_verify() {
        let (_dir, store) = store();
        store.register("alice", "secret").unwrap();

        assert!(store.verify("alice", "secret").unwrap());
        assert!(!store.verify("alice", "wrong").unwrap());
        assert!(!store.verify("bob", "secret").unwrap());
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let (_dir, store) = store();
        store.register("alice", "one").unwrap();

        let err = store.register("alice", "two").unwrap_err();
        assert!(matches!(err, CredentialError::UserExists(_)));
        assert!(store.verify("alice", "one").unwrap());
    }

    #[test]
    fn test_file_is_append_only_plaintext() {
        let (_dir, store) = store();
        store.register("alice", "a").unwrap();
        store.register("bob", "b").unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "alice,a\nbob,b\n");
    }

    #[test]
    fn test_invalid_fields() {
        let (_dir, store) = store();
        assert!(matches!(store.register("", "x"), Err(CredentialError::Invalid(_))));
        assert!(matches!(store.register("a,b", "x"), Err(CredentialError::Invalid(_))));
        assert!(matches!(store.register("ann", "x\ny"), Err(CredentialError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_has_no_users() {
        let (_dir, store) = store();
        assert!(!store.verify("anyone", "pw").unwrap());
    }
}
