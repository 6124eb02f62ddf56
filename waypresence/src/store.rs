//! Durable key-value storage for presence state
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::Result;

/// Minimal synchronous key-value store
///
/// Every `set` must be durable (as far as the backend allows) by the time it returns.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T> KeyValueStore for Box<T>
where
    T: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Store that lives only as long as the process
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    inner: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store keeping all the keys in a single JSON object on disk
///
/// The whole file is rewritten on every `set`: written to a temporary
/// file, fsynced and renamed over the previous version.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: BTreeMap<String, String>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "presence.json";

    /// Open the store in `data_dir`, creating the directory if needed
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Self::open(data_dir.join(Self::FILE_NAME))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let cache = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(cache) => cache,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupted store file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No store file yet");
                BTreeMap::new()
            }
            Err(e) => Err(e)?,
        };

        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_out(&self) -> Result<()> {
        let tmp_path = self.tmp_path();
        let bytes = serde_json::to_vec(&self.cache)?;

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        trace!(path = %self.path.display(), size = bytes.len(), "Store written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let prev = self.cache.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.write_out() {
            // keep the cache consistent with what is on disk
            match prev {
                Some(prev) => self.cache.insert(key.to_owned(), prev),
                None => self.cache.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set() -> Result<()> {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("area")?, None);
        store.set("area", "Infosys")?;
        store.set("area", "None")?;
        assert_eq!(store.get("area")?.as_deref(), Some("None"));
        Ok(())
    }

    #[test]
    fn file_store_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let mut store = FileStore::open_in(dir.path())?;
        store.set("area", "Besant Nagar")?;
        store.set("queue", r#"["Besant Nagar"]"#)?;
        drop(store);

        let store = FileStore::open_in(dir.path())?;
        assert_eq!(store.get("area")?.as_deref(), Some("Besant Nagar"));
        assert_eq!(store.get("queue")?.as_deref(), Some(r#"["Besant Nagar"]"#));
        assert!(!store.tmp_path().exists());
        Ok(())
    }

    #[test]
    fn file_store_ignores_corrupted_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(FileStore::FILE_NAME), b"{not json")?;

        let mut store = FileStore::open_in(dir.path())?;
        assert_eq!(store.get("area")?, None);
        store.set("area", "None")?;
        assert_eq!(
            FileStore::open_in(dir.path())?.get("area")?.as_deref(),
            Some("None")
        );
        Ok(())
    }
}
