//! Resampling of the latest frame into new top-down rasters.
//!
//! Every algorithm reads the bottom-up source through `FrameView::row`, so the
//! row flip is part of its coordinate math rather than a separate pass. All of
//! them run inside `FrameBuffer::with_read_lock`.
//!
//! Destination pixel centers map to source coordinates with
//! `(d + 0.5) * scale - 0.5`, where `scale = src_dim / dst_dim`.

mod bicubic;
mod bilinear;
mod block;
mod nearest;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{invalid, FrameError, Result};
use crate::frame::{FrameBuffer, FrameView};
use crate::raster::Raster;

pub use bicubic::{mitchell_netravali, Bicubic};
pub use bilinear::Bilinear;
pub use block::{check_block_factor, downscale_by_block};
pub use nearest::Nearest;

/// A resize algorithm from a bottom-up 24-bit source to a top-down raster.
pub trait Resampler: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Fill `dst` from `view`. `view` is known to be 24-bit.
    fn resample(&self, view: &FrameView<'_>, dst: &mut Raster);
}

/// Selects one of the interchangeable resize algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

static NEAREST: Nearest = Nearest;
static BILINEAR: Bilinear = Bilinear;
static BICUBIC: Bicubic = Bicubic;

impl ResizeFilter {
    pub const ALL: [ResizeFilter; 3] = [
        ResizeFilter::Nearest,
        ResizeFilter::Bilinear,
        ResizeFilter::Bicubic,
    ];

    pub fn resampler(self) -> &'static dyn Resampler {
        match self {
            ResizeFilter::Nearest => &NEAREST,
            ResizeFilter::Bilinear => &BILINEAR,
            ResizeFilter::Bicubic => &BICUBIC,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.resampler().name()
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeFilter {
    type Err = FrameError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "bilinear" => Ok(ResizeFilter::Bilinear),
            "bicubic" => Ok(ResizeFilter::Bicubic),
            other => Err(invalid(format!("unknown resize filter '{other}'"))),
        }
    }
}

/// Resize the latest frame to `width x height` with `filter`.
///
/// Returns `Ok(None)` before the first push and for a zero target dimension.
pub fn resize(
    buffer: &FrameBuffer,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<Option<Raster>> {
    if width == 0 || height == 0 {
        return Ok(None);
    }
    buffer
        .with_read_lock(|view| resample_view(&view, width, height, filter))
        .transpose()
}

/// Resize an already locked view. Zero dimensions are rejected.
pub fn resample_view(
    view: &FrameView<'_>,
    width: u32,
    height: u32,
    filter: ResizeFilter,
) -> Result<Raster> {
    check_dimensions(width, height)?;
    view.require_rgb24()?;
    let mut raster = Raster::new(width, height)?;
    filter.resampler().resample(view, &mut raster);
    Ok(raster)
}

/// Block-average the latest frame by the integer factor `n`.
pub fn block_average(buffer: &FrameBuffer, n: u32) -> Result<Option<Raster>> {
    if n == 0 {
        return Err(invalid("block factor must be positive"));
    }
    buffer
        .with_read_lock(|view| downscale_by_block(&view, n))
        .transpose()
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(invalid(format!(
            "resize dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}

#[inline]
pub(crate) fn source_coord(d: usize, scale: f64) -> f64 {
    (d as f64 + 0.5) * scale - 0.5
}

#[inline]
pub(crate) fn scale(src: usize, dst: u32) -> f64 {
    src as f64 / dst as f64
}


#[cfg(test)]
mod tests {
    use super::test_support::frame_from_fn;
    use super::*;
    use crate::frame::FrameGeometry;

    #[test]
    fn filter_names_round_trip() {
        for filter in ResizeFilter::ALL {
            assert_eq!(filter.as_str().parse::<ResizeFilter>().unwrap(), filter);
        }
        assert!("lanczos".parse::<ResizeFilter>().is_err());
    }

    #[test]
    fn resize_without_frame_is_none() {
        let buffer = FrameBuffer::new();
        for filter in ResizeFilter::ALL {
            assert!(resize(&buffer, 4, 4, filter).unwrap().is_none());
        }
        assert!(block_average(&buffer, 2).unwrap().is_none());
    }

    #[test]
    fn zero_dimensions_give_empty_result() {
        let buffer = FrameBuffer::new();
        buffer.allocate(FrameGeometry::rgb24(2, 2).unwrap()).unwrap();
        buffer.push(&[0u8; 12]).unwrap();
        let (geometry, data) = frame_from_fn(2, 2, |_, _| [0, 0, 0]);
        let view = FrameView::new(geometry, &data).unwrap();
        for filter in ResizeFilter::ALL {
            assert_eq!(resize(&buffer, 0, 4, filter), Ok(None));
            assert_eq!(resize(&buffer, 4, 0, filter), Ok(None));
            assert!(matches!(
                resample_view(&view, 0, 4, filter),
                Err(FrameError::InvalidParameter(_))
            ));
        }
        assert!(matches!(
            block_average(&buffer, 0),
            Err(FrameError::InvalidParameter(_))
        ));
    }

    #[test]
    fn outputs_have_aligned_stride() {
        let (geometry, data) = frame_from_fn(7, 5, |x, y| [x as u8, y as u8, 0]);
        let view = FrameView::new(geometry, &data).unwrap();
        for filter in ResizeFilter::ALL {
            let raster = resample_view(&view, 5, 3, filter).unwrap();
            assert_eq!(raster.stride(), 16);
            assert_eq!(raster.data().len(), 48);
        }
    }

    #[test]
    fn upscale_extremes_stay_in_bounds() {
        let (geometry, data) = frame_from_fn(3, 2, |x, y| [x as u8 * 40, y as u8 * 90, 7]);
        let view = FrameView::new(geometry, &data).unwrap();
        for filter in ResizeFilter::ALL {
            for (w, h) in [(1, 1), (1000, 1), (1, 700), (97, 61), (2, 300)] {
                let raster = resample_view(&view, w, h, filter).unwrap();
                assert_eq!((raster.width(), raster.height()), (w, h));
            }
        }
        let (geometry, data) = frame_from_fn(1, 1, |_, _| [9, 8, 7]);
        let view = FrameView::new(geometry, &data).unwrap();
        for filter in ResizeFilter::ALL {
            let raster = resample_view(&view, 13, 5, filter).unwrap();
            for y in 0..5 {
                for x in 0..13 {
                    assert_eq!(raster.pixel(x, y), [9, 8, 7], "{filter} at {x},{y}");
                }
            }
        }
    }

    #[test]
    fn non_rgb24_frames_are_rejected() {
        let buffer = FrameBuffer::new();
        buffer.allocate(FrameGeometry::new(2, 2, 4).unwrap()).unwrap();
        buffer.push(&[0u8; 16]).unwrap();
        assert!(matches!(
            resize(&buffer, 1, 1, ResizeFilter::Nearest),
            Err(FrameError::UnsupportedPixelFormat(4))
        ));
    }
}
