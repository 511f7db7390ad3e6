use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use common::{Error, Result, SubscriberRegistry};

/// Subscriber chat ids persisted as a JSON array.
///
/// The file is rewritten on every successful `add`/`remove`.
pub struct JsonSubscriberRegistry {
    path: PathBuf,
    chats: Mutex<BTreeSet<i64>>,
}

impl JsonSubscriberRegistry {
    /// Open the registry at `path`. A missing file is created empty; an empty
    /// or unreadable file is reset to an empty set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let chats = if path.exists() {
            match read_chats(&path) {
                Ok(chats) => chats,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Subscribers file unreadable, resetting");
                    let empty = BTreeSet::new();
                    write_chats(&path, &empty)?;
                    empty
                }
            }
        } else {
            let empty = BTreeSet::new();
            write_chats(&path, &empty)?;
            empty
        };
        info!(path = %path.display(), subscribers = chats.len(), "Subscribers loaded");

        Ok(Self {
            path,
            chats: Mutex::new(chats),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and persist when it reports a modification. The
    /// in-memory set is only updated once the file write succeeds.
    fn update(&self, change: impl FnOnce(&mut BTreeSet<i64>) -> bool) -> Result<bool> {
        let mut chats = self
            .chats
            .lock()
            .map_err(|_| Error::Config("subscriber registry lock poisoned".into()))?;
        let mut next = chats.clone();
        if !change(&mut next) {
            return Ok(false);
        }
        write_chats(&self.path, &next)?;
        info!(subscribers = next.len(), "Subscribers saved");
        *chats = next;
        Ok(true)
    }
}

impl SubscriberRegistry for JsonSubscriberRegistry {
    fn subscribers(&self) -> BTreeSet<i64> {
        match self.chats.lock() {
            Ok(chats) => chats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn add(&self, recipient: i64) -> Result<bool> {
        self.update(|chats| chats.insert(recipient))
    }

    fn remove(&self, recipient: i64) -> Result<bool> {
        self.update(|chats| chats.remove(&recipient))
    }
}

fn read_chats(path: &Path) -> Result<BTreeSet<i64>> {
    let data = fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Err(Error::Parse("subscribers file is empty".into()));
    }
    Ok(serde_json::from_str(&data)?)
}

fn write_chats(path: &Path, chats: &BTreeSet<i64>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string(chats)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        let registry = JsonSubscriberRegistry::open(&path).unwrap();
        assert!(registry.subscribers().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn add_and_remove_persist_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        let registry = JsonSubscriberRegistry::open(&path).unwrap();

        assert!(registry.add(42).unwrap());
        assert!(!registry.add(42).unwrap());
        assert!(registry.add(-100123).unwrap());

        let reopened = JsonSubscriberRegistry::open(&path).unwrap();
        assert_eq!(reopened.subscribers(), BTreeSet::from([-100123, 42]));

        assert!(reopened.remove(42).unwrap());
        assert!(!reopened.remove(42).unwrap());
        let again = JsonSubscriberRegistry::open(&path).unwrap();
        assert_eq!(again.subscribers(), BTreeSet::from([-100123]));
    }

    #[test]
    fn corrupt_or_empty_file_resets() {
        let dir = tempfile::tempdir().unwrap();
        for contents in ["", "{not json", "[\"a\"]"] {
            let path = dir.path().join("subscribers.json");
            fs::write(&path, contents).unwrap();
            let registry = JsonSubscriberRegistry::open(&path).unwrap();
            assert!(registry.subscribers().is_empty(), "contents {contents:?}");
            assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        }
    }

    #[test]
    fn reads_existing_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.json");
        fs::write(&path, "[3, 1, 2, 1]").unwrap();
        let registry = JsonSubscriberRegistry::open(&path).unwrap();
        assert_eq!(registry.subscribers(), BTreeSet::from([1, 2, 3]));
    }
}
