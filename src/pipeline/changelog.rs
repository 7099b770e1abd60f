use std::io::{BufRead as _, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::TileId;
use crate::foundation::error::{PixelmapError, PixelmapResult};
use crate::tile::code::TileCode;

/// One "tile changed to code X" record from the append-only history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub sequence_index: u64,
    pub tile_id: TileId,
    pub tile_code: TileCode,
    pub block_number: u64,
}

/// Read side of the change history.
///
/// `list` returns events ordered by strictly increasing `sequence_index`. Entries already returned
/// must be returned again, unchanged, by later calls.
pub trait ChangeLog: Send {
    fn list(&self) -> PixelmapResult<Vec<ChangeEvent>>;
}

impl<L: ChangeLog + ?Sized> ChangeLog for Box<L> {
    fn list(&self) -> PixelmapResult<Vec<ChangeEvent>> {
        (**self).list()
    }
}

fn check_order(prev: Option<u64>, next: u64) -> PixelmapResult<()> {
    if next == u64::MAX {
        return Err(PixelmapError::validation(
            "sequence index u64::MAX leaves no cursor value past it",
        ));
    }
    match prev {
        Some(p) if next <= p => Err(PixelmapError::validation(format!(
            "change log out of order: sequence index {next} after {p}"
        ))),
        _ => Ok(()),
    }
}

/// Shared in-memory log. Clones append to and read from the same history.
#[derive(Clone, Debug, Default)]
pub struct MemoryChangeLog {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> MutexGuard<'_, Vec<ChangeEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an event; its sequence index must exceed every recorded one.
    pub fn append(&self, event: ChangeEvent) -> PixelmapResult<()> {
        let mut events = self.events();
        check_order(events.last().map(|e| e.sequence_index), event.sequence_index)?;
        events.push(event);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

impl ChangeLog for MemoryChangeLog {
    fn list(&self) -> PixelmapResult<Vec<ChangeEvent>> {
        Ok(self.events().clone())
    }
}

/// Change history stored as JSON lines, one [`ChangeEvent`] per line. Blank lines are ignored.
#[derive(Clone, Debug)]
pub struct JsonlChangeLog {
    path: PathBuf,
}

impl JsonlChangeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChangeLog for JsonlChangeLog {
    fn list(&self) -> PixelmapResult<Vec<ChangeEvent>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("open change log '{}'", self.path.display()))
            .map_err(|e| PixelmapError::io(format!("{e:#}")))?;

        let mut out: Vec<ChangeEvent> = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                PixelmapError::io(format!("read '{}': {e}", self.path.display()))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let event: ChangeEvent = serde_json::from_str(&line).map_err(|e| {
                PixelmapError::serde(format!(
                    "'{}' line {}: {e}",
                    self.path.display(),
                    lineno + 1
                ))
            })?;
            check_order(out.last().map(|e| e.sequence_index), event.sequence_index)?;
            out.push(event);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/changelog.rs"]
mod tests;
