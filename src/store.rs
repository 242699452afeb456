//! String key-value persistence for the chat client.
//!
//! The client keeps a handful of small records between runs: the active thread, the
//! per-day question counter and the signed-in user.  [`KeyValueStore`] abstracts over
//! where they live; [`MemoryStore`] keeps them in memory and [`JsonFileStore`] writes
//! them to a JSON object on disk.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use time::{Date, OffsetDateTime};

use crate::error::{Error, Result};

/// Key of the last active thread id.
pub const CURRENT_THREAD_KEY: &str = "currentThreadId";
/// Key of the bearer token of the signed-in user.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Key of the JSON-serialized signed-in user.
pub const USER_KEY: &str = "user";
/// Prefix of the per-day question counter keys.
pub const QUESTION_COUNT_PREFIX: &str = "questionCount_";

/// Returns the counter key for `date`, e.g. `questionCount_2024-03-07`.
pub fn question_count_key(date: Date) -> String {
    format!(
        "{QUESTION_COUNT_PREFIX}{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Today's date in the local time zone, or in UTC if the local offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// A string to string store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`.  Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Reads the counter stored under `key`.  Missing or unparsable values count as 0.
    fn get_count(&self, key: &str) -> Result<u64> {
        Ok(self
            .get(key)?
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Adds one to the counter under `key` and returns the new value.
    fn increment(&self, key: &str) -> Result<u64> {
        let count = self.get_count(key)? + 1;
        self.set(key, &count.to_string())?;
        Ok(count)
    }
}

/// A store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// A store persisted as a pretty-printed JSON object.
///
/// The whole file is rewritten on every [`set`](KeyValueStore::set) and
/// [`remove`](KeyValueStore::remove).
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`.  A missing file is an empty store; it is created on the
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(Error::io(
                    format!("Failed to open store {}", path.display()),
                    err,
                ));
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path).map_err(|err| {
            Error::io(format!("Failed to write store {}", self.path.display()), err)
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
