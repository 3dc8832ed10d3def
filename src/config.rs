use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::frame::FrameGeometry;
use crate::ingest::SourceConfig;
use crate::resample::{check_block_factor, ResizeFilter};

const DEFAULT_SOURCE_URL: &str = "stub://synthetic";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 30;
const DEFAULT_RESIZE_WIDTH: u32 = 320;
const DEFAULT_RESIZE_HEIGHT: u32 = 180;
const DEFAULT_BLOCK_FACTOR: u32 = 8;
const DEFAULT_OUTPUT_DIR: &str = "grab_out";

#[derive(Debug, Deserialize, Default)]
struct GrabberConfigFile {
    output_dir: Option<PathBuf>,
    source: Option<SourceConfigFile>,
    capture: Option<CaptureConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    enabled: Option<bool>,
    filter: Option<ResizeFilter>,
    resize_width: Option<u32>,
    resize_height: Option<u32>,
    block_factor: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GrabberConfig {
    pub output_dir: PathBuf,
    pub source: SourceSettings,
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Initial capture mode of the session.
    pub enabled: bool,
    pub filter: ResizeFilter,
    pub resize_width: u32,
    pub resize_height: u32,
    pub block_factor: u32,
}

impl GrabberConfig {
    /// Defaults, then the JSON file named by `GRABBER_CONFIG`, then `GRABBER_*` overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("GRABBER_CONFIG").ok();
        match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Self::load_from(Some(Path::new(path))),
            _ => Self::load_from(None),
        }
    }

    /// Defaults, then `path` if given, then `GRABBER_*` overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = path.map(read_config_file).transpose()?;
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: GrabberConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        let capture = file.capture.unwrap_or_default();
        Self {
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            source: SourceSettings {
                url: source.url.unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                width: source.width.unwrap_or(DEFAULT_WIDTH),
                height: source.height.unwrap_or(DEFAULT_HEIGHT),
                target_fps: source.target_fps.unwrap_or(DEFAULT_FPS),
            },
            capture: CaptureSettings {
                enabled: capture.enabled.unwrap_or(true),
                filter: capture.filter.unwrap_or_default(),
                resize_width: capture.resize_width.unwrap_or(DEFAULT_RESIZE_WIDTH),
                resize_height: capture.resize_height.unwrap_or(DEFAULT_RESIZE_HEIGHT),
                block_factor: capture.block_factor.unwrap_or(DEFAULT_BLOCK_FACTOR),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("GRABBER_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(dir) = std::env::var("GRABBER_OUT") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Some(width) = env_u32("GRABBER_WIDTH")? {
            self.source.width = width;
        }
        if let Some(height) = env_u32("GRABBER_HEIGHT")? {
            self.source.height = height;
        }
        if let Some(fps) = env_u32("GRABBER_FPS")? {
            self.source.target_fps = fps;
        }
        if let Some(block) = env_u32("GRABBER_BLOCK")? {
            self.capture.block_factor = block;
        }
        if let Ok(filter) = std::env::var("GRABBER_FILTER") {
            if !filter.trim().is_empty() {
                self.capture.filter = filter
                    .parse()
                    .map_err(|e| anyhow!("GRABBER_FILTER: {}", e))?;
            }
        }
        Ok(())
    }

    /// Check settings changed after loading (e.g. by CLI flags).
    pub fn validate(&self) -> Result<()> {
        let geometry = FrameGeometry::rgb24(self.source.width, self.source.height)
            .map_err(|e| anyhow!("source geometry: {}", e))?;
        if self.capture.resize_width == 0 || self.capture.resize_height == 0 {
            return Err(anyhow!("resize dimensions must be greater than zero"));
        }
        check_block_factor(geometry, self.capture.block_factor)
            .map_err(|e| anyhow!("capture.block_factor: {}", e))?;
        Ok(())
    }

    pub fn source_config(&self, max_frames: Option<u64>) -> SourceConfig {
        SourceConfig {
            url: self.source.url.clone(),
            width: self.source.width,
            height: self.source.height,
            target_fps: self.source.target_fps,
            max_frames,
        }
    }
}

fn read_config_file(path: &Path) -> Result<GrabberConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a non-negative integer", key)),
        _ => Ok(None),
    }
}
