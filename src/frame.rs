//! Latest-frame storage.
//!
//! - `FrameGeometry`: shape of the frames delivered in the current session.
//! - `FrameBuffer`: the single raw pixel buffer, one writer and any number of readers.
//! - `FrameView`: read-only view handed to readers while the buffer lock is held.
//!
//! Storage is kept in the source's native delivery order: bottom-up, so memory
//! row 0 is the bottom scan line. Every reader translates top-down row indices
//! through [`memory_row`] rather than re-deriving the flip itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{FrameError, Result};

/// Bytes per pixel of the 24-bit interleaved format every pixel operation expects.
pub const RGB24_BYTES_PER_PIXEL: u32 = 3;

/// Memory row holding top-down row `y` of a bottom-up raster with `height` rows.
#[inline]
pub fn memory_row(height: usize, y: usize) -> usize {
    height - 1 - y
}

// ----------------------------------------------------------------------------
// FrameGeometry
// ----------------------------------------------------------------------------

/// Frame shape for one capture session. Immutable until the session stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    stride: usize,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32, bytes_per_pixel: u32) -> Result<Self> {
        let invalid = || FrameError::InvalidGeometry {
            width,
            height,
            bytes_per_pixel,
        };
        if width == 0 || height == 0 || bytes_per_pixel == 0 {
            return Err(invalid());
        }
        let stride = (width as usize)
            .checked_mul(bytes_per_pixel as usize)
            .ok_or_else(invalid)?;
        stride.checked_mul(height as usize).ok_or_else(invalid)?;
        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            stride,
        })
    }

    /// 24-bit geometry, the only pixel format the resamplers accept.
    pub fn rgb24(width: u32, height: u32) -> Result<Self> {
        Self::new(width, height, RGB24_BYTES_PER_PIXEL)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    /// Byte distance between consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Exact byte length of one frame (`height * stride`).
    pub fn frame_len(&self) -> usize {
        self.stride * self.height as usize
    }
}

// ----------------------------------------------------------------------------
// FrameView
// ----------------------------------------------------------------------------

/// Read-only view of the stored frame. Only exists while the buffer lock is held.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    geometry: FrameGeometry,
    data: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Wrap a bottom-up byte plane. `data` must be exactly `geometry.frame_len()` bytes.
    pub fn new(geometry: FrameGeometry, data: &'a [u8]) -> Result<Self> {
        if data.len() != geometry.frame_len() {
            return Err(FrameError::BufferLengthMismatch {
                expected: geometry.frame_len(),
                actual: data.len(),
            });
        }
        Ok(Self { geometry, data })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn width(&self) -> usize {
        self.geometry.width as usize
    }

    pub fn height(&self) -> usize {
        self.geometry.height as usize
    }

    pub fn stride(&self) -> usize {
        self.geometry.stride
    }

    /// Raw storage in bottom-up order.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes of top-down row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = memory_row(self.height(), y) * self.stride();
        &self.data[start..start + self.stride()]
    }

    /// Pixel operations only understand 24-bit interleaved frames.
    pub fn require_rgb24(&self) -> Result<()> {
        if self.geometry.bytes_per_pixel != RGB24_BYTES_PER_PIXEL {
            return Err(FrameError::UnsupportedPixelFormat(
                self.geometry.bytes_per_pixel,
            ));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// FrameBuffer
// ----------------------------------------------------------------------------

struct FrameStorage {
    geometry: FrameGeometry,
    data: Vec<u8>,
    /// Set by the first successful push of the session.
    filled: bool,
}

/// Single-slot frame buffer shared between the video source and its readers.
///
/// One mutex guards the storage. `push` and every reader take it, so a reader
/// sees either the whole of one pushed frame or the whole of a later one.
/// Pushes are latest-wins: nothing is queued.
pub struct FrameBuffer {
    storage: Mutex<Option<FrameStorage>>,
    frames_pushed: AtomicU64,
    frames_dropped: AtomicU64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            storage: Mutex::new(None),
            frames_pushed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    // A reader that panicked inside `with_read_lock` never mutated storage,
    // so a poisoned lock still guards a consistent frame.
    fn lock(&self) -> MutexGuard<'_, Option<FrameStorage>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate zeroed storage for a new session, replacing any previous allocation.
    pub fn allocate(&self, geometry: FrameGeometry) -> Result<()> {
        let len = geometry.frame_len();
        let data = crate::error::alloc_zeroed(len)?;
        *self.lock() = Some(FrameStorage {
            geometry,
            data,
            filled: false,
        });
        log::debug!(
            "FrameBuffer: allocated {}x{} ({} bytes)",
            geometry.width(),
            geometry.height(),
            len
        );
        Ok(())
    }

    /// Release storage. Safe to call when nothing is allocated.
    pub fn release(&self) {
        if self.lock().take().is_some() {
            log::debug!("FrameBuffer: released");
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.lock().is_some()
    }

    /// True once a frame has been pushed into the current allocation.
    pub fn has_frame(&self) -> bool {
        self.lock().as_ref().is_some_and(|storage| storage.filled)
    }

    pub fn geometry(&self) -> Option<FrameGeometry> {
        self.lock().as_ref().map(|storage| storage.geometry)
    }

    /// Replace the stored frame with `raw`.
    ///
    /// A frame whose length disagrees with the session geometry is dropped and
    /// the previous frame stays observable.
    pub fn push(&self, raw: &[u8]) -> Result<()> {
        let mut guard = self.lock();
        let Some(storage) = guard.as_mut() else {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            return Err(FrameError::NotAllocated);
        };
        if raw.len() != storage.data.len() {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            return Err(FrameError::BufferLengthMismatch {
                expected: storage.data.len(),
                actual: raw.len(),
            });
        }
        storage.data.copy_from_slice(raw);
        storage.filled = true;
        self.frames_pushed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Run `f` against the current frame while holding the buffer lock.
    ///
    /// Returns `None` when no frame has been pushed in the current session.
    pub fn with_read_lock<R>(&self, f: impl FnOnce(FrameView<'_>) -> R) -> Option<R> {
        let guard = self.lock();
        let storage = guard.as_ref().filter(|storage| storage.filled)?;
        Some(f(FrameView {
            geometry: storage.geometry,
            data: &storage.data,
        }))
    }

    /// Frames accepted since the buffer was created.
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed.load(Ordering::Relaxed)
    }

    /// Frames rejected by `push` since the buffer was created.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
