use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context as _;
use image::{DynamicImage, ImageFormat};

use crate::foundation::error::{PixelmapError, PixelmapResult};

/// Destination for rendered images, addressed by a path relative to the sink's root.
///
/// Ordering contract: `write` calls for one event complete before the worker advances the cursor,
/// so a successful return must mean the image is durable and fully visible at `rel_path`.
pub trait ImageSink: Send {
    fn write(&mut self, rel_path: &Path, image: &DynamicImage) -> PixelmapResult<()>;
}

/// Writes PNG files under a root directory.
///
/// Each image is encoded into a temporary sibling file and renamed over the target, so readers
/// see either the previous file or the new one, never a partial write.
#[derive(Debug, Clone)]
pub struct FsImageSink {
    root: PathBuf,
}

impl FsImageSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageSink for FsImageSink {
    fn write(&mut self, rel_path: &Path, image: &DynamicImage) -> PixelmapResult<()> {
        if rel_path.is_absolute() {
            return Err(PixelmapError::validation(format!(
                "sink path '{}' must be relative",
                rel_path.display()
            )));
        }
        let out_path = self.root.join(rel_path);
        write_png_atomic(&out_path, image).map_err(|e| PixelmapError::io(format!("{e:#}")))
    }
}

pub fn ensure_parent_dir(path: &Path) -> PixelmapResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Flush the directory entry of `path` so a rename into it survives a crash. No-op off unix,
/// where directories cannot be opened for syncing.
pub(crate) fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        File::open(parent)?.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

fn write_png_atomic(out_path: &Path, image: &DynamicImage) -> anyhow::Result<()> {
    ensure_parent_dir(out_path)?;

    let file_name = out_path
        .file_name()
        .with_context(|| format!("output path '{}' has no file name", out_path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp_path = out_path.with_file_name(tmp_name);

    let result = (|| -> anyhow::Result<()> {
        let file = File::create(&tmp_path)
            .with_context(|| format!("create '{}'", tmp_path.display()))?;
        let mut w = BufWriter::new(file);
        image
            .write_to(&mut w, ImageFormat::Png)
            .with_context(|| format!("encode png '{}'", out_path.display()))?;
        w.flush()?;
        let file = w.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, out_path)
            .with_context(|| format!("move png into place at '{}'", out_path.display()))?;
        sync_parent_dir(out_path)
            .with_context(|| format!("sync directory of '{}'", out_path.display()))?;
        Ok(())
    })();

    if result.is_err() {
        std::fs::remove_file(&tmp_path).ok();
    }
    result
}

/// In-memory sink for tests and debugging.
///
/// Clones share the same storage, so a test can keep a handle while a worker owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemorySinkState>>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    writes: Vec<PathBuf>,
    files: BTreeMap<PathBuf, DynamicImage>,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemorySinkState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Accept `n` more writes, then fail every write with [`PixelmapError::Io`].
    pub fn fail_after(&self, n: usize) {
        let mut st = self.state();
        st.fail_after = Some(st.writes.len() + n);
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        self.state().fail_after = None;
    }

    /// Every successful write, in call order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.state().writes.clone()
    }

    /// Current content at `rel_path` (later writes replace earlier ones).
    pub fn get(&self, rel_path: impl AsRef<Path>) -> Option<DynamicImage> {
        self.state().files.get(rel_path.as_ref()).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }
}

impl ImageSink for MemorySink {
    fn write(&mut self, rel_path: &Path, image: &DynamicImage) -> PixelmapResult<()> {
        let mut st = self.state();
        if st.fail_after.is_some_and(|limit| st.writes.len() >= limit) {
            return Err(PixelmapError::io(format!(
                "injected write failure for '{}'",
                rel_path.display()
            )));
        }
        st.writes.push(rel_path.to_path_buf());
        st.files.insert(rel_path.to_path_buf(), image.clone());
        Ok(())
    }
}

impl<S: ImageSink + ?Sized> ImageSink for Box<S> {
    fn write(&mut self, rel_path: &Path, image: &DynamicImage) -> PixelmapResult<()> {
        (**self).write(rel_path, image)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
