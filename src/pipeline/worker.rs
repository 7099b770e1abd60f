use std::sync::{Mutex, MutexGuard};

use crate::encode::sink::ImageSink;
use crate::foundation::config::RendererConfig;
use crate::foundation::core::GridGeometry;
use crate::foundation::error::{PixelmapError, PixelmapResult};
use crate::pipeline::changelog::{ChangeEvent, ChangeLog};
use crate::pipeline::cursor::{CursorStore, IncrementalCursor};
use crate::pipeline::snapshot::{ChangeDedupFilter, Classification};
use crate::render::fullmap::render_full_map;
use crate::render::tile::render_tile;
use crate::tile::code::decode_tile_code;
use crate::tile::raster::TileRaster;

/// Whether a pass is in flight. There is no failed state: every pass ends `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
}

/// Counters for one completed pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Cursor value when the pass started.
    pub start_cursor: u64,
    /// Cursor value when the pass ended.
    pub cursor: u64,
    /// Events consumed (cursor advanced past them).
    pub processed: u64,
    pub rendered: u64,
    pub unchanged: u64,
    pub skipped_malformed: u64,
    pub skipped_out_of_range: u64,
}

/// Result of a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassReport),
    /// Another pass was already running; this trigger did nothing.
    Suppressed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EventOutcome {
    Rendered,
    Unchanged,
    Malformed,
    OutOfRange,
}

struct Collaborators<L, C, S> {
    log: L,
    cursor: IncrementalCursor<C>,
    sink: S,
}

/// Runs incremental render passes over a change log, one at a time.
pub struct RenderWorker<L, C, S> {
    geometry: GridGeometry,
    state: Mutex<WorkerState>,
    parts: Mutex<Collaborators<L, C, S>>,
}

/// Holds `Running` for the lifetime of a pass and restores `Idle` on every exit path.
struct RunningGuard<'a> {
    state: &'a Mutex<WorkerState>,
}

impl<'a> RunningGuard<'a> {
    fn enter(state: &'a Mutex<WorkerState>) -> Option<Self> {
        let mut s = lock(state);
        if *s == WorkerState::Running {
            return None;
        }
        *s = WorkerState::Running;
        Some(Self { state })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = WorkerState::Idle;
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl<L, C, S> RenderWorker<L, C, S>
where
    L: ChangeLog,
    C: CursorStore,
    S: ImageSink,
{
    pub fn new(config: &RendererConfig, log: L, store: C, sink: S) -> PixelmapResult<Self> {
        config.validate()?;
        Ok(Self {
            geometry: config.geometry()?,
            state: Mutex::new(WorkerState::Idle),
            parts: Mutex::new(Collaborators {
                log,
                cursor: IncrementalCursor::new(store, config.cursor_key.clone()),
                sink,
            }),
        })
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn state(&self) -> WorkerState {
        *lock(&self.state)
    }

    /// Current persisted cursor value.
    pub fn cursor(&self) -> PixelmapResult<u64> {
        lock(&self.parts).cursor.read()
    }

    /// Run one pass unless one is already running.
    ///
    /// On error the cursor stays after the last fully rendered event; the next trigger resumes
    /// with the event that failed.
    pub fn trigger(&self) -> PixelmapResult<PassOutcome> {
        let Some(_running) = RunningGuard::enter(&self.state) else {
            tracing::debug!("render pass already running, trigger ignored");
            return Ok(PassOutcome::Suppressed);
        };

        let mut parts = lock(&self.parts);
        match run_pass(&mut parts, self.geometry) {
            Ok(report) => {
                if report.processed > 0 {
                    tracing::info!(
                        cursor = report.cursor,
                        processed = report.processed,
                        rendered = report.rendered,
                        unchanged = report.unchanged,
                        malformed = report.skipped_malformed,
                        out_of_range = report.skipped_out_of_range,
                        "render pass complete"
                    );
                }
                Ok(PassOutcome::Completed(report))
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(error = %err, "render pass aborted, next trigger retries");
                Err(err)
            }
            Err(err) => {
                tracing::error!(error = %err, "render pass aborted");
                Err(err)
            }
        }
    }
}

#[tracing::instrument(level = "debug", skip_all)]
fn run_pass<L, C, S>(
    parts: &mut Collaborators<L, C, S>,
    geometry: GridGeometry,
) -> PixelmapResult<PassReport>
where
    L: ChangeLog,
    C: CursorStore,
    S: ImageSink,
{
    let start = parts.cursor.read()?;
    let events = parts.log.list()?;
    let mut report = PassReport {
        start_cursor: start,
        cursor: start,
        ..PassReport::default()
    };

    // Rebuild last-known codes from events already rendered by earlier passes, so the full map
    // keeps every tile painted before this pass.
    let mut dedup = ChangeDedupFilter::new(geometry);
    let split = events.partition_point(|e| e.sequence_index < start);
    for event in &events[..split] {
        if geometry.contains(event.tile_id) && event.tile_code.is_renderable(geometry) {
            dedup.seed(event.tile_id, &event.tile_code)?;
        }
    }

    for event in &events[split..] {
        // Checked before rendering so an unreachable cursor value never causes repeated writes.
        let next = event.sequence_index.checked_add(1).ok_or_else(|| {
            PixelmapError::validation(format!(
                "sequence index {} overflows the cursor range",
                event.sequence_index
            ))
        })?;
        match process_event(parts, &mut dedup, geometry, event)? {
            EventOutcome::Rendered => report.rendered += 1,
            EventOutcome::Unchanged => report.unchanged += 1,
            EventOutcome::Malformed => report.skipped_malformed += 1,
            EventOutcome::OutOfRange => report.skipped_out_of_range += 1,
        }
        parts.cursor.advance(next)?;
        report.cursor = next;
        report.processed += 1;
    }

    Ok(report)
}

fn process_event<L, C, S>(
    parts: &mut Collaborators<L, C, S>,
    dedup: &mut ChangeDedupFilter,
    geometry: GridGeometry,
    event: &ChangeEvent,
) -> PixelmapResult<EventOutcome>
where
    S: ImageSink,
{
    let seq = event.sequence_index;
    let tile = event.tile_id;
    if !geometry.contains(tile) {
        tracing::warn!(seq, %tile, "tile outside grid, skipping");
        return Ok(EventOutcome::OutOfRange);
    }

    let raster = match decode_event(event, geometry) {
        Ok(raster) => raster,
        Err(err @ PixelmapError::MalformedCode(_)) => {
            if event.tile_code.is_blank() {
                tracing::debug!(seq, %tile, "blank tile code, skipping");
            } else {
                tracing::warn!(seq, %tile, error = %err, "tile code refused, skipping");
            }
            return Ok(EventOutcome::Malformed);
        }
        Err(err) => return Err(err),
    };

    if dedup.classify(tile, &event.tile_code)? == Classification::Unchanged {
        tracing::trace!(seq, %tile, "tile code unchanged, not re-rendering");
        return Ok(EventOutcome::Unchanged);
    }

    render_tile(&mut parts.sink, geometry, tile, event.block_number, &raster)?;
    render_full_map(&mut parts.sink, geometry, event.block_number, dedup.table())?;
    tracing::debug!(seq, %tile, block = event.block_number, "rendered tile");
    Ok(EventOutcome::Rendered)
}

fn decode_event(event: &ChangeEvent, geometry: GridGeometry) -> PixelmapResult<TileRaster> {
    Ok(decode_tile_code(&event.tile_code, geometry)?)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/worker.rs"]
mod tests;
