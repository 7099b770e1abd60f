use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::encode::sink::{ensure_parent_dir, sync_parent_dir};
use crate::foundation::error::{PixelmapError, PixelmapResult};

/// Durable integer store keyed by name.
///
/// `set` must be durable when it returns: a following `get`, from this process or after a
/// restart, observes the new value. Missing keys read as 0.
pub trait CursorStore: Send {
    fn get(&self, key: &str) -> PixelmapResult<u64>;
    fn set(&mut self, key: &str, value: u64) -> PixelmapResult<()>;
}

impl<C: CursorStore + ?Sized> CursorStore for Box<C> {
    fn get(&self, key: &str) -> PixelmapResult<u64> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: u64) -> PixelmapResult<()> {
        (**self).set(key, value)
    }
}

/// Progress marker over the change log: the sequence index of the next unprocessed event.
#[derive(Debug)]
pub struct IncrementalCursor<C> {
    store: C,
    key: String,
}

impl<C: CursorStore> IncrementalCursor<C> {
    pub fn new(store: C, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn read(&self) -> PixelmapResult<u64> {
        self.store.get(&self.key)
    }

    /// Persist `to` as the new position. Equal values are a no-op; lower values are refused.
    pub fn advance(&mut self, to: u64) -> PixelmapResult<()> {
        let current = self.read()?;
        if to < current {
            return Err(PixelmapError::CursorRegression {
                current,
                requested: to,
            });
        }
        if to == current {
            return Ok(());
        }
        self.store.set(&self.key, to)
    }
}

/// Shared in-memory store. Clones see the same values.
#[derive(Clone, Debug, Default)]
pub struct MemoryCursorStore {
    state: Arc<Mutex<MemoryCursorState>>,
}

#[derive(Debug, Default)]
struct MemoryCursorState {
    values: BTreeMap<String, u64>,
    sets: usize,
    fail_after: Option<usize>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryCursorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of successful `set` calls so far.
    pub fn set_count(&self) -> usize {
        self.state().sets
    }

    /// Accept `n` more `set` calls, then fail every `set` with [`PixelmapError::Io`].
    pub fn fail_after(&self, n: usize) {
        let mut st = self.state();
        st.fail_after = Some(st.sets + n);
    }

    pub fn heal(&self) {
        self.state().fail_after = None;
    }
}

impl CursorStore for MemoryCursorStore {
    fn get(&self, key: &str) -> PixelmapResult<u64> {
        Ok(self.state().values.get(key).copied().unwrap_or(0))
    }

    fn set(&mut self, key: &str, value: u64) -> PixelmapResult<()> {
        let mut st = self.state();
        if st.fail_after.is_some_and(|limit| st.sets >= limit) {
            return Err(PixelmapError::io(format!(
                "injected cursor write failure for '{key}'"
            )));
        }
        st.values.insert(key.to_string(), value);
        st.sets += 1;
        Ok(())
    }
}

/// Cursor values kept as a JSON object (`{"key": 12}`) in one file, replaced atomically per `set`.
#[derive(Clone, Debug)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PixelmapResult<BTreeMap<String, u64>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(PixelmapError::io(format!(
                    "read cursor file '{}': {e}",
                    self.path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            PixelmapError::serde(format!("cursor file '{}': {e}", self.path.display()))
        })
    }

    fn store(&self, values: &BTreeMap<String, u64>) -> PixelmapResult<()> {
        ensure_parent_dir(&self.path)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let body = serde_json::to_vec_pretty(values)?;
        let io_err = |e: std::io::Error| {
            PixelmapError::io(format!("write cursor file '{}': {e}", self.path.display()))
        };
        let mut f = std::fs::File::create(&tmp).map_err(io_err)?;
        f.write_all(&body).map_err(io_err)?;
        f.sync_all().map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        sync_parent_dir(&self.path).map_err(io_err)
    }
}

impl CursorStore for FileCursorStore {
    fn get(&self, key: &str) -> PixelmapResult<u64> {
        Ok(self.load()?.get(key).copied().unwrap_or(0))
    }

    fn set(&mut self, key: &str, value: u64) -> PixelmapResult<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value);
        self.store(&values)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/cursor.rs"]
mod tests;
