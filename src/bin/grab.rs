//! grab - run a synthetic capture session and write what the readers see
//!
//! Writes into the output directory:
//! - `capture.png` / `capture_verified.png`: orientation-corrected frame
//! - `resize_<filter>.png`: resampled frame
//! - `block_<n>.png`: block-averaged frame
//! - `raw.bin`: the stored frame, bottom-up, as delivered

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use frame_grabber::{
    block_average, resize, CaptureSession, GrabberConfig, Raster, ResizeFilter, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file.
    #[arg(long, env = "GRABBER_CONFIG")]
    config: Option<PathBuf>,
    /// Frames to deliver before capturing. 0 runs until Ctrl-C.
    #[arg(long, default_value_t = 10)]
    frames: u64,
    /// Output directory (overrides config).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Resize filter (nearest|bilinear|bicubic).
    #[arg(long)]
    filter: Option<ResizeFilter>,
    /// Resize target width.
    #[arg(long)]
    width: Option<u32>,
    /// Resize target height.
    #[arg(long)]
    height: Option<u32>,
    /// Block-average factor.
    #[arg(long)]
    block: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = GrabberConfig::load_from(args.config.as_deref())?;
    if let Some(out) = args.out {
        cfg.output_dir = out;
    }
    if let Some(filter) = args.filter {
        cfg.capture.filter = filter;
    }
    if let Some(width) = args.width {
        cfg.capture.resize_width = width;
    }
    if let Some(height) = args.height {
        cfg.capture.resize_height = height;
    }
    if let Some(block) = args.block {
        cfg.capture.block_factor = block;
    }
    cfg.validate()?;

    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("failed to create {}", cfg.output_dir.display()))?;

    let session = Arc::new(CaptureSession::new(cfg.capture.enabled));
    let max_frames = (args.frames > 0).then_some(args.frames);
    let source = SyntheticSource::new(cfg.source_config(max_frames))?;
    let mut handle = source.spawn(session.clone())?;

    if max_frames.is_some() {
        handle.wait();
    } else {
        let (tx, rx) = mpsc::channel();
        ctrlc::set_handler(move || {
            let _ = tx.send(());
        })
        .context("failed to install Ctrl-C handler")?;
        log::info!("grab: delivering frames, press Ctrl-C to capture and exit");
        let _ = rx.recv();
    }
    log::info!("grab: {} frames delivered", handle.frames_delivered());

    let out = &cfg.output_dir;
    let corrector = session.corrector();
    let captured = corrector
        .capture()?
        .ok_or_else(|| anyhow!("no frame captured (capture mode off or zero frames?)"))?;
    write_png(&captured, &out.join("capture.png"))?;
    if let Some(verified) = corrector.capture_verified()? {
        write_png(&verified, &out.join("capture_verified.png"))?;
    }

    let filter = cfg.capture.filter;
    if let Some(resized) = resize(
        session.buffer(),
        cfg.capture.resize_width,
        cfg.capture.resize_height,
        filter,
    )? {
        write_png(&resized, &out.join(format!("resize_{}.png", filter)))?;
    }

    let n = cfg.capture.block_factor;
    if let Some(blocked) = block_average(session.buffer(), n)? {
        write_png(&blocked, &out.join(format!("block_{}.png", n)))?;
    }

    if let Some(raw) = session.exporter().export_raw() {
        let path = out.join("raw.bin");
        fs::write(&path, &raw).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("grab: wrote {} ({} bytes)", path.display(), raw.len());
    }

    let stats = handle.stop();
    let session_stats = session.stats();
    log::info!(
        "grab: source {} delivered {} frames ({} stored, {} dropped, {} ignored)",
        stats.url,
        stats.frames_delivered,
        session_stats.frames_pushed,
        session_stats.frames_dropped,
        session_stats.frames_ignored
    );
    Ok(())
}

fn write_png(raster: &Raster, path: &Path) -> Result<()> {
    raster
        .to_rgb_image()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!(
        "grab: wrote {} ({}x{})",
        path.display(),
        raster.width(),
        raster.height()
    );
    Ok(())
}
