//! Synthetic frame source.
//!
//! `SyntheticSource` stands in for a capture device behind a `stub://` URL.
//! It reports its geometry to a `FrameSink` and then pushes bottom-up BGR
//! frames from a dedicated thread until stopped.
//!
//! Every pixel of frame `k` carries `k mod 256` in its red channel, so a reader
//! can tell whether the frame it observed came from a single push.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{invalid, FrameError, Result};
use crate::frame::{memory_row, FrameGeometry};
use crate::session::FrameSink;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Source URL; only `stub://` is accepted.
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Frames per second. Zero pushes as fast as the sink accepts them.
    pub target_fps: u32,
    /// Stop on its own after this many frames.
    pub max_frames: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "stub://synthetic".to_string(),
            width: 640,
            height: 480,
            target_fps: 30,
            max_frames: None,
        }
    }
}

/// Statistics for a synthetic source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_delivered: u64,
    pub url: String,
}

pub struct SyntheticSource {
    config: SourceConfig,
    geometry: FrameGeometry,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        if !config.url.starts_with("stub://") {
            return Err(invalid(format!(
                "unsupported source url '{}' (only stub:// sources are built in)",
                config.url
            )));
        }
        let geometry = FrameGeometry::rgb24(config.width, config.height)?;
        Ok(Self {
            config,
            geometry,
            frame_count: 0,
        })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Next frame in delivery order (bottom-up, B, G, R).
    ///
    /// Top-down pixel `(x, y)` of frame `k` is `(x * 7 + k, y * 3, k)`.
    pub fn next_frame(&mut self) -> Vec<u8> {
        let k = self.frame_count;
        self.frame_count += 1;

        let width = self.geometry.width() as usize;
        let height = self.geometry.height() as usize;
        let stride = self.geometry.stride();
        let mut pixels = vec![0u8; self.geometry.frame_len()];
        for y in 0..height {
            let row_start = memory_row(height, y) * stride;
            let row = &mut pixels[row_start..row_start + stride];
            for (x, px) in row.chunks_exact_mut(3).take(width).enumerate() {
                px[0] = (x as u64 * 7 + k) as u8;
                px[1] = (y * 3) as u8;
                px[2] = k as u8;
            }
        }
        pixels
    }

    /// Announce geometry to `sink`, then push frames from a new thread.
    pub fn spawn<S>(mut self, sink: Arc<S>) -> Result<SourceHandle>
    where
        S: FrameSink + 'static,
    {
        let geometry = self.geometry;
        sink.on_geometry_known(
            geometry.width(),
            geometry.height(),
            geometry.bytes_per_pixel(),
        )?;
        log::info!(
            "SyntheticSource: connected to {} ({}x{})",
            self.config.url,
            geometry.width(),
            geometry.height()
        );

        let stop = Arc::new(AtomicBool::new(false));
        let delivered = Arc::new(AtomicU64::new(0));
        let frame_interval = match self.config.target_fps {
            0 => None,
            fps => Some(Duration::from_secs(1) / fps),
        };
        let max_frames = self.config.max_frames;
        let url = self.config.url.clone();

        let thread = {
            let stop = stop.clone();
            let delivered = delivered.clone();
            let sink = sink.clone();
            thread::Builder::new()
                .name("synthetic-source".to_string())
                .spawn(move || {
                    while !stop.load(Ordering::SeqCst) {
                        let frame = self.next_frame();
                        if let Err(err) = sink.on_frame_pushed(&frame) {
                            log::trace!("SyntheticSource: frame rejected: {}", err);
                        }
                        let count = delivered.fetch_add(1, Ordering::SeqCst) + 1;
                        if max_frames.is_some_and(|max| count >= max) {
                            break;
                        }
                        match frame_interval {
                            Some(interval) => thread::sleep(interval),
                            None => thread::yield_now(),
                        }
                    }
                })
                .map_err(|err| {
                    FrameError::Source(format!("failed to start delivery thread: {err}"))
                })?
        };

        Ok(SourceHandle {
            url,
            stop,
            delivered,
            thread: Some(thread),
            sink,
        })
    }
}

/// Running synthetic source. Dropping the handle stops it.
pub struct SourceHandle {
    url: String,
    stop: Arc<AtomicBool>,
    delivered: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
    sink: Arc<dyn FrameSink>,
}

impl SourceHandle {
    pub fn frames_delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    /// True until the delivery thread exits (stopped or `max_frames` reached).
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Block until the source has delivered its `max_frames`.
    pub fn wait(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("SyntheticSource: delivery thread panicked");
            }
        }
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_delivered: self.frames_delivered(),
            url: self.url.clone(),
        }
    }

    /// Stop delivery, join the thread and stop the sink.
    pub fn stop(mut self) -> SourceStats {
        self.shutdown();
        self.stats()
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wait();
        self.sink.stop();
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
