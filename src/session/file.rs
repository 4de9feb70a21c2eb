//! JSON-file backed store for headless use. The whole file is rewritten on
//! every change through a uniquely named sibling and a rename, so multi-key
//! writes land together and concurrent writers never share a temporary file.

use super::{SessionStore, StoreError};
use serde_json::{Map, Value};
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Serialization(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        let tmp = PathBuf::from(tmp);

        let written = write_private(&tmp, &serde_json::to_vec_pretty(entries)?)
            .and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }

        debug!("session file written: {}", self.path.display());

        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = self.load()?;
        Ok(entries
            .get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string))
    }

    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut current = self.load()?;
        let mut changed = false;
        for (key, value) in set {
            current.insert((*key).to_string(), Value::String((*value).to_string()));
            changed = true;
        }
        for key in remove {
            changed |= current.remove(*key).is_some();
        }
        if !changed && !self.path.exists() {
            return Ok(());
        }
        self.persist(&current)
    }
}

/// Creates `path` readable by the owner only before any byte is written.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FileGuard(PathBuf);

    impl Drop for FileGuard {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    fn temp_path() -> (PathBuf, FileGuard) {
        let path = std::env::temp_dir().join(format!("authfetch-{}.json", uuid::Uuid::new_v4()));
        (path.clone(), FileGuard(path))
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let (path, _guard) = temp_path();
        let store = FileStore::new(&path);
        assert!(store.get("accessToken").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_new_instance() {
        let (path, _guard) = temp_path();
        FileStore::new(&path)
            .set(&[("accessToken", "a"), ("refreshToken", "r")])
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("a"));
        assert_eq!(reopened.get("refreshToken").unwrap().as_deref(), Some("r"));
    }

    #[test]
    fn test_clear_keeps_unrelated_keys() {
        let (path, _guard) = temp_path();
        let store = FileStore::new(&path);
        store.set(&[("accessToken", "a"), ("theme", "dark")]).unwrap();
        store.clear(&["accessToken"]).unwrap();

        assert!(store.get("accessToken").unwrap().is_none());
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_clear_on_missing_file_does_not_create_it() {
        let (path, _guard) = temp_path();
        FileStore::new(&path).clear(&["accessToken"]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_rejects_non_object_file() {
        let (path, _guard) = temp_path();
        fs::write(&path, "[1, 2, 3]").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("accessToken"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_update_removes_stale_key_in_one_write() {
        let (path, _guard) = temp_path();
        let store = FileStore::new(&path);
        store.set(&[("authUser", "stale")]).unwrap();

        store.update(&[("accessToken", "a")], &["authUser"]).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("a"));
        assert!(reopened.get("authUser").unwrap().is_none());
    }

    #[test]
    fn test_instances_sharing_a_file_write_concurrently() {
        let (path, _guard) = temp_path();

        let writers: Vec<_> = (0..2)
            .map(|writer| {
                let store = FileStore::new(&path);
                std::thread::spawn(move || {
                    (0..200)
                        .filter_map(|i| {
                            let value = format!("{writer}-{i}");
                            store
                                .set(&[
                                    ("accessToken", value.as_str()),
                                    ("refreshToken", value.as_str()),
                                ])
                                .err()
                        })
                        .map(|err| err.to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for writer in writers {
            let errors = writer.join().unwrap();
            assert!(errors.is_empty(), "write errors: {errors:?}");
        }

        let store = FileStore::new(&path);
        let access = store.get("accessToken").unwrap().unwrap();
        assert_eq!(store.get("refreshToken").unwrap(), Some(access));

        let parent = path.parent().unwrap();
        let prefix = path.file_name().unwrap().to_string_lossy().into_owned();
        let leftovers = fs::read_dir(parent)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.starts_with(&prefix) && name.ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (path, _guard) = temp_path();
        FileStore::new(&path).set(&[("accessToken", "a")]).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
