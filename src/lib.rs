//! Incremental renderer for a grid of user-painted tiles.
//!
//! Tile content lives in an append-only change log as compact hex codes (three digits per pixel).
//! A [`RenderWorker`] consumes that log from a durable cursor and keeps two kinds of PNG output
//! current:
//!
//! - `<tile>/<block>.png` and `<tile>/latest.png`: one tile upscaled with nearest-neighbour
//! - `fullmap/<block>.png` and `fullmap/fullMap.png`: every tile at native resolution
//!
//! # Pipeline overview
//!
//! 1. **Decode**: [`TileCode`] -> [`TileRaster`] ([`decode_tile_code`])
//! 2. **Dedup**: [`ChangeDedupFilter`] skips codes identical to the tile's last-seen code
//! 3. **Render**: [`render_tile`] and [`render_full_map`] write through an [`ImageSink`]
//! 4. **Checkpoint**: [`IncrementalCursor::advance`] after every event, never batched
//!
//! Passes are single-flight: a trigger that arrives while a pass is running returns
//! [`PassOutcome::Suppressed`]. A failed write aborts the pass and leaves the cursor on the event
//! that failed, so the next trigger retries it.
#![forbid(unsafe_code)]

mod encode;
mod foundation;
mod pipeline;
mod render;
mod tile;

pub use encode::layout::OutputLayout;
pub use encode::sink::{FsImageSink, ImageSink, MemorySink, ensure_parent_dir};
pub use foundation::config::{DEFAULT_CURSOR_KEY, RendererConfig};
pub use foundation::core::{GridGeometry, Rgb8, TileId};
pub use foundation::error::{PixelmapError, PixelmapResult};
pub use pipeline::changelog::{ChangeEvent, ChangeLog, JsonlChangeLog, MemoryChangeLog};
pub use pipeline::cursor::{CursorStore, FileCursorStore, IncrementalCursor, MemoryCursorStore};
pub use pipeline::scheduler::{Scheduler, SchedulerStats};
pub use pipeline::snapshot::{ChangeDedupFilter, Classification, TileSnapshotTable};
pub use pipeline::worker::{PassOutcome, PassReport, RenderWorker, WorkerState};
pub use render::fullmap::{BLANK_CELL, compose_full_map, render_full_map};
pub use render::tile::{render_tile, upscale_nearest};
pub use tile::code::{TileCode, TileCodeError, decode_tile_code, encode_tile_code};
pub use tile::raster::TileRaster;
