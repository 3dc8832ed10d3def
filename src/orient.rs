//! Bottom-up to top-down orientation correction.
//!
//! Two strategies produce the same raster:
//! - `InPlace` copies rows in reverse order straight out of the locked buffer.
//! - `Reverify` snapshots the whole buffer under the lock and reverses it
//!   afterwards. It is slower and exists to cross-check the in-place path.

use crate::error::{invalid, Result};
use crate::frame::{FrameBuffer, FrameView};
use crate::raster::{Raster, Rect};
use crate::resample::{self, ResizeFilter};

/// Copy `view` into `dst` as a top-down raster with `dst_stride` bytes per row.
///
/// Row `y` of `dst` receives the first `min(dst_stride, src_stride)` bytes of
/// memory row `height - 1 - y`. Remaining bytes of each destination row are
/// left untouched.
pub fn to_top_down(view: &FrameView<'_>, dst: &mut [u8], dst_stride: usize) {
    let copy_len = dst_stride.min(view.stride());
    for (y, dst_row) in dst
        .chunks_mut(dst_stride)
        .take(view.height())
        .enumerate()
    {
        dst_row[..copy_len].copy_from_slice(&view.row(y)[..copy_len]);
    }
}

/// Reverse the row order of a tightly packed buffer with one block copy per row.
pub fn reverse_rows(bytes: &[u8], stride: usize) -> Vec<u8> {
    let mut reversed = Vec::with_capacity(bytes.len());
    for row in bytes.chunks_exact(stride).rev() {
        reversed.extend_from_slice(row);
    }
    reversed
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    InPlace,
    Reverify,
}

/// Produces orientation-corrected copies of the latest frame.
pub struct OrientationCorrector<'a> {
    buffer: &'a FrameBuffer,
}

impl<'a> OrientationCorrector<'a> {
    pub fn new(buffer: &'a FrameBuffer) -> Self {
        Self { buffer }
    }

    /// Top-down copy of the latest frame, or `None` before the first push.
    pub fn capture(&self) -> Result<Option<Raster>> {
        self.capture_with(Strategy::InPlace)
    }

    /// Same output as [`capture`](Self::capture) through the snapshot-then-reverse path.
    pub fn capture_verified(&self) -> Result<Option<Raster>> {
        self.capture_with(Strategy::Reverify)
    }

    pub fn capture_with(&self, strategy: Strategy) -> Result<Option<Raster>> {
        match strategy {
            Strategy::InPlace => self
                .buffer
                .with_read_lock(|view| {
                    view.require_rgb24()?;
                    let geometry = view.geometry();
                    let mut raster = Raster::new(geometry.width(), geometry.height())?;
                    let stride = raster.stride();
                    to_top_down(&view, raster.data_mut(), stride);
                    Ok(raster)
                })
                .transpose(),
            Strategy::Reverify => {
                let Some(snapshot) = self
                    .buffer
                    .with_read_lock(|view| (view.geometry(), view.data().to_vec()))
                else {
                    return Ok(None);
                };
                let (geometry, bytes) = snapshot;
                let view = FrameView::new(geometry, &bytes)?;
                view.require_rgb24()?;

                let top_down = reverse_rows(&bytes, geometry.stride());
                let mut raster = Raster::new(geometry.width(), geometry.height())?;
                let dst_stride = raster.stride();
                for (dst_row, src_row) in raster
                    .data_mut()
                    .chunks_mut(dst_stride)
                    .zip(top_down.chunks_exact(geometry.stride()))
                {
                    dst_row[..src_row.len()].copy_from_slice(src_row);
                }
                Ok(Some(raster))
            }
        }
    }

    /// Top-down copy of `rect` (top-down coordinates) from the latest frame.
    pub fn capture_region(&self, rect: Rect) -> Result<Option<Raster>> {
        self.buffer
            .with_read_lock(|view| {
                view.require_rgb24()?;
                let geometry = view.geometry();
                if !rect.fits_within(geometry.width(), geometry.height()) {
                    return Err(invalid(format!(
                        "region {rect:?} outside {}x{} frame",
                        geometry.width(),
                        geometry.height()
                    )));
                }
                let mut raster = Raster::new(rect.width, rect.height)?;
                let dst_stride = raster.stride();
                let left = rect.x as usize * 3;
                let right = left + rect.width as usize * 3;
                for (dy, dst_row) in raster.data_mut().chunks_mut(dst_stride).enumerate() {
                    let src_row = view.row(rect.y as usize + dy);
                    dst_row[..right - left].copy_from_slice(&src_row[left..right]);
                }
                Ok(raster)
            })
            .transpose()
    }

    /// Top-down copy of the latest frame resized to `width x height` (bilinear).
    pub fn capture_scaled(&self, width: u32, height: u32) -> Result<Option<Raster>> {
        resample::resize(self.buffer, width, height, ResizeFilter::Bilinear)
    }
}

/// Caller-owned surface reused across captures.
///
/// The surface is reallocated only when the frame geometry changes; every
/// capture hands back a clone so the caller never aliases the surface.
#[derive(Debug, Default)]
pub struct CaptureSurface {
    raster: Option<Raster>,
}

impl CaptureSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&mut self, buffer: &FrameBuffer) -> Result<Option<Raster>> {
        let surface = &mut self.raster;
        buffer
            .with_read_lock(|view| {
                view.require_rgb24()?;
                let geometry = view.geometry();
                let raster = match surface.take() {
                    Some(raster)
                        if raster.width() == geometry.width()
                            && raster.height() == geometry.height() =>
                    {
                        raster
                    }
                    _ => Raster::new(geometry.width(), geometry.height())?,
                };
                let raster = surface.insert(raster);
                let stride = raster.stride();
                to_top_down(&view, raster.data_mut(), stride);
                Ok(raster.clone())
            })
            .transpose()
    }

    /// Dimensions of the current surface, if one has been allocated.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.raster
            .as_ref()
            .map(|raster| (raster.width(), raster.height()))
    }
}
