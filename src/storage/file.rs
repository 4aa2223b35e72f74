// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-backed storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::Storage;
use crate::error::StorageError;

/// [`Storage`] persisted as a single JSON object on disk.
///
/// The whole map is cached in memory and rewritten on every mutation. Writes
/// go to a sibling temporary file which is then renamed over the target, so a
/// crash mid-write leaves the previous contents intact.
///
/// # Examples
///
/// ```no_run
/// use push_activation::storage::{FileStorage, Storage};
///
/// # fn example() -> Result<(), push_activation::error::StorageError> {
/// let storage = FileStorage::open("/var/lib/myapp/push.json")?;
/// storage.put("PUSH_CURRENT_STATE", "NotActivated")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the store at `path`, loading existing contents if the file exists.
    ///
    /// Parent directories are created on first write, not here.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            tracing::debug!(path = %path.display(), "No storage file found, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|current| current == value) {
            return Ok(());
        }
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}
