use std::{
    collections::HashMap,
    fs::File,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::warn;

use crate::error::{Result, TrackerError};

/// Key/value persistence with `localStorage` semantics.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key under `root`.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path backing a key
    pub fn item_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json.tmp", key))
    }
}

impl Storage for FileStorage {
    /// Invalid UTF-8 is replaced rather than reported, so damaged files reach the
    /// caller as unparsable content instead of an I/O error.
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let bytes = match std::fs::read(self.item_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match String::from_utf8(bytes) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) => {
                warn!(key, error = %e, "stored item is not valid UTF-8");
                Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        }
    }

    /// Writes a sibling temp file and renames it over the item, so a failed write
    /// leaves the previous value intact.
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let tmp_path = self.tmp_path(key);

        let written = File::create(&tmp_path).and_then(|mut f| {
            f.write_all(value.as_bytes())?;
            f.sync_all()
        });
        if let Err(e) = written.and_then(|()| std::fs::rename(&tmp_path, self.item_path(key))) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.item_path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process storage with an optional byte quota.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
    quota: Option<usize>,
}

#[derive(Default)]
struct MemoryInner {
    items: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the total size of keys plus values, in bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Mutex::default(),
            quota: Some(quota),
        }
    }

    /// Make every subsequent operation fail, like a browser with storage disabled.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.unavailable {
            return Err(TrackerError::StorageUnavailable {
                reason: "storage disabled".to_string(),
            });
        }
        Ok(guard)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(quota) = self.quota {
            let others: usize = inner
                .items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(TrackerError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock()?.items.remove(key);
        Ok(())
    }
}
