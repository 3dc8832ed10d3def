//! Capture session: the boundary the video source talks to.
//!
//! The source reports geometry once (`on_geometry_known`), pushes frames from
//! its own thread (`on_frame_pushed`) and is stopped by the session owner
//! (`stop`). Whether pushes are accepted is session state (`capture_mode`),
//! not a process-wide flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{FrameError, Result};
use crate::export::RawExporter;
use crate::frame::{FrameBuffer, FrameGeometry};
use crate::orient::OrientationCorrector;

/// Callbacks a video source drives. Implementations must tolerate calls from any thread.
pub trait FrameSink: Send + Sync {
    /// Capture started with frames of this shape.
    fn on_geometry_known(&self, width: u32, height: u32, bytes_per_pixel: u32) -> Result<()>;

    /// One delivered frame, bottom-up. Malformed frames are dropped, never fatal.
    fn on_frame_pushed(&self, raw: &[u8]) -> Result<()>;

    /// Capture stopped. Idempotent.
    fn stop(&self);
}

/// Snapshot of session counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionStats {
    pub geometry: Option<FrameGeometry>,
    pub frames_pushed: u64,
    pub frames_dropped: u64,
    pub frames_ignored: u64,
    pub capture_mode: bool,
}

pub struct CaptureSession {
    buffer: FrameBuffer,
    capture_mode: AtomicBool,
    frames_ignored: AtomicU64,
}

impl CaptureSession {
    /// New session. Pushes are stored only while `capture_mode` is on.
    pub fn new(capture_mode: bool) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            capture_mode: AtomicBool::new(capture_mode),
            frames_ignored: AtomicU64::new(0),
        }
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn corrector(&self) -> OrientationCorrector<'_> {
        OrientationCorrector::new(&self.buffer)
    }

    pub fn exporter(&self) -> RawExporter<'_> {
        RawExporter::new(&self.buffer)
    }

    pub fn set_capture_mode(&self, enabled: bool) {
        let previous = self.capture_mode.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            log::info!(
                "CaptureSession: capture mode {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn capture_mode(&self) -> bool {
        self.capture_mode.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            geometry: self.buffer.geometry(),
            frames_pushed: self.buffer.frames_pushed(),
            frames_dropped: self.buffer.frames_dropped(),
            frames_ignored: self.frames_ignored.load(Ordering::Relaxed),
            capture_mode: self.capture_mode(),
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FrameSink for CaptureSession {
    fn on_geometry_known(&self, width: u32, height: u32, bytes_per_pixel: u32) -> Result<()> {
        let geometry = FrameGeometry::new(width, height, bytes_per_pixel)?;
        self.buffer.allocate(geometry)?;
        log::info!(
            "CaptureSession: started {}x{} ({} bytes/pixel, stride {})",
            width,
            height,
            bytes_per_pixel,
            geometry.stride()
        );
        Ok(())
    }

    fn on_frame_pushed(&self, raw: &[u8]) -> Result<()> {
        if !self.capture_mode() {
            self.frames_ignored.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        self.buffer.push(raw).inspect_err(|err| match err {
            FrameError::BufferLengthMismatch { .. } => {
                log::warn!("CaptureSession: dropped frame: {}", err)
            }
            _ => log::debug!("CaptureSession: push rejected: {}", err),
        })
    }

    fn stop(&self) {
        if self.buffer.is_allocated() {
            log::info!(
                "CaptureSession: stopped after {} frames ({} dropped)",
                self.buffer.frames_pushed(),
                self.buffer.frames_dropped()
            );
        }
        self.buffer.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_announcement_allocates() {
        let session = CaptureSession::default();
        session.on_geometry_known(4, 2, 3).unwrap();
        assert_eq!(
            session.stats().geometry,
            Some(FrameGeometry::rgb24(4, 2).unwrap())
        );
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let session = CaptureSession::default();
        assert!(matches!(
            session.on_geometry_known(0, 2, 3),
            Err(FrameError::InvalidGeometry { .. })
        ));
        assert!(!session.buffer().is_allocated());
    }

    #[test]
    fn capture_mode_off_ignores_pushes() {
        let session = CaptureSession::new(false);
        session.on_geometry_known(1, 1, 3).unwrap();
        session.on_frame_pushed(&[1, 2, 3]).unwrap();
        assert!(!session.buffer().has_frame());
        assert_eq!(session.stats().frames_ignored, 1);

        session.set_capture_mode(true);
        session.on_frame_pushed(&[1, 2, 3]).unwrap();
        assert!(session.buffer().has_frame());
    }

    #[test]
    fn malformed_frame_does_not_end_stream() {
        let session = CaptureSession::default();
        session.on_geometry_known(1, 1, 3).unwrap();
        assert!(session.on_frame_pushed(&[1, 2]).is_err());
        session.on_frame_pushed(&[4, 5, 6]).unwrap();
        let stats = session.stats();
        assert_eq!((stats.frames_pushed, stats.frames_dropped), (1, 1));
    }

    #[test]
    fn stop_without_frames_is_safe() {
        let session = CaptureSession::default();
        session.stop();
        session.on_geometry_known(2, 2, 3).unwrap();
        session.stop();
        session.stop();
        assert!(session.exporter().export_raw().is_none());
    }
}
