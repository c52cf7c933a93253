// Filesystem backup store.
//
// Layout: `<root>/<identity>/<identity>.txt`. Existing files are replaced.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::error::CoreError;

/// Writes configuration snapshots under a root directory.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a backup for `identity` is written to.
    pub fn path_for(&self, identity: &str) -> Result<PathBuf, CoreError> {
        validate_identity(identity)?;
        Ok(self.root.join(identity).join(format!("{identity}.txt")))
    }

    /// Write `content` byte-for-byte, creating directories as needed.
    /// Returns the file path; data is synced before returning.
    pub fn persist(&self, identity: &str, content: &str) -> Result<PathBuf, CoreError> {
        let path = self.path_for(identity)?;
        let dir = self.root.join(identity);

        fs::create_dir_all(&dir).map_err(|source| CoreError::Storage {
            path: dir.clone(),
            source,
        })?;

        let storage = |source| CoreError::Storage {
            path: path.clone(),
            source,
        };
        let mut file = File::create(&path).map_err(storage)?;
        file.write_all(content.as_bytes()).map_err(storage)?;
        file.sync_all().map_err(storage)?;

        debug!(path = %path.display(), bytes = content.len(), "backup written");
        Ok(path)
    }
}

/// Identities become directory and file names, so anything that could
/// escape the root or name a special entry is refused.
fn validate_identity(identity: &str) -> Result<(), CoreError> {
    let unsafe_name = identity.is_empty()
        || identity == "."
        || identity == ".."
        || identity
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());
    if unsafe_name {
        return Err(CoreError::InvalidIdentity {
            identity: identity.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_identity_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackupStore::new(tmp.path());

        let path = store.persist("PE1", "<rpc-reply/>").unwrap();

        assert_eq!(path, tmp.path().join("PE1").join("PE1.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<rpc-reply/>");
    }

    #[test]
    fn overwrites_previous_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackupStore::new(tmp.path());

        store.persist("PE1", "first, and much longer than the second").unwrap();
        let path = store.persist("PE1", "second").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn creates_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackupStore::new(tmp.path().join("nested").join("backups"));

        let path = store.persist("P1", "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn refuses_identities_that_escape_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackupStore::new(tmp.path());

        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "bad\nname"] {
            let err = store.persist(bad, "x").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Storage, "identity {bad:?}");
        }
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_root_is_a_storage_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = BackupStore::new(&blocker).persist("PE1", "x").unwrap_err();
        assert!(matches!(err, CoreError::Storage { .. }));
    }
}
