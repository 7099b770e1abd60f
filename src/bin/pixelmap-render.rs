use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use sha2::Digest as _;

use pixelmap_render::{
    FileCursorStore, FsImageSink, JsonlChangeLog, PassOutcome, RenderWorker, RendererConfig,
    Scheduler,
};

#[derive(Parser, Debug)]
#[command(name = "pixelmap-render", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single render pass over the change log.
    Pass(StoreArgs),
    /// Trigger render passes on a fixed interval.
    Watch(WatchArgs),
    /// Print the SHA-256 of every rendered PNG, sorted by path.
    Digest(DigestArgs),
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Change log, one JSON event per line.
    #[arg(long)]
    log: PathBuf,

    /// Cursor state file (created on first advance).
    #[arg(long)]
    cursor: PathBuf,

    /// Output root for tile and full-map images.
    #[arg(long)]
    out: PathBuf,

    /// Renderer config JSON. Defaults to the 63x63 grid.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Milliseconds between triggers.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Stop after this many triggers.
    #[arg(long)]
    ticks: Option<u64>,
}

#[derive(Args, Debug)]
struct DigestArgs {
    /// Output root to scan.
    #[arg(long)]
    out: PathBuf,
}

type FileWorker = RenderWorker<JsonlChangeLog, FileCursorStore, FsImageSink>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Pass(args) => cmd_pass(args),
        Command::Watch(args) => cmd_watch(args),
        Command::Digest(args) => cmd_digest(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn make_worker(args: &StoreArgs) -> anyhow::Result<FileWorker> {
    let config = RendererConfig::load(args.config.as_deref()).context("load renderer config")?;
    let worker = RenderWorker::new(
        &config,
        JsonlChangeLog::new(&args.log),
        FileCursorStore::new(&args.cursor),
        FsImageSink::new(&args.out),
    )?;
    Ok(worker)
}

fn cmd_pass(args: StoreArgs) -> anyhow::Result<()> {
    let worker = make_worker(&args)?;
    match worker.trigger().context("render pass")? {
        PassOutcome::Completed(r) => {
            eprintln!(
                "cursor {} -> {}: {} events, {} rendered, {} unchanged, {} malformed, {} out of range",
                r.start_cursor,
                r.cursor,
                r.processed,
                r.rendered,
                r.unchanged,
                r.skipped_malformed,
                r.skipped_out_of_range
            );
        }
        PassOutcome::Suppressed => eprintln!("pass already running"),
    }
    Ok(())
}

fn cmd_watch(args: WatchArgs) -> anyhow::Result<()> {
    let worker = make_worker(&args.store)?;
    let mut scheduler = Scheduler::new(Duration::from_millis(args.interval_ms));
    if let Some(ticks) = args.ticks {
        scheduler = scheduler.with_max_ticks(ticks);
    }
    let stats = scheduler.run(&worker);
    eprintln!(
        "{} ticks: {} completed, {} failed ({} fatal), {} events processed",
        stats.ticks, stats.completed, stats.failed, stats.fatal, stats.events_processed
    );
    Ok(())
}

fn cmd_digest(args: DigestArgs) -> anyhow::Result<()> {
    let mut files = Vec::new();
    collect_pngs(&args.out, &mut files)?;
    files.sort();
    for path in files {
        let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
        let rel = path.strip_prefix(&args.out).unwrap_or(&path);
        println!("{}  {}", sha256_hex(&bytes), rel.display());
    }
    Ok(())
}

fn collect_pngs(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_pngs(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "png") {
            out.push(path);
        }
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
