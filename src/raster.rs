//! Top-down output rasters.

use image::RgbImage;

use crate::error::{alloc_zeroed, invalid, Result};
use crate::frame::RGB24_BYTES_PER_PIXEL;

/// Row stride for a 24-bit row of `width` pixels, padded to a 4-byte boundary.
pub fn aligned_stride(width: u32) -> usize {
    (width as usize * RGB24_BYTES_PER_PIXEL as usize + 3) & !3
}

/// Top-down 24-bit raster owned by the caller.
///
/// Channels keep the source's memory order (B, G, R). Padding bytes at the end
/// of each row are zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Zeroed raster with a 4-byte aligned stride.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_stride(width, height, aligned_stride(width))
    }

    /// Zeroed raster with an explicit stride, at least `width * 3`.
    pub fn with_stride(width: u32, height: u32, stride: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(invalid(format!(
                "raster dimensions must be positive, got {width}x{height}"
            )));
        }
        let min_stride = width as usize * RGB24_BYTES_PER_PIXEL as usize;
        if stride < min_stride {
            return Err(invalid(format!(
                "raster stride {stride} shorter than row of {min_stride} bytes"
            )));
        }
        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| invalid("raster size overflows"))?;
        Ok(Self {
            width,
            height,
            stride,
            data: alloc_zeroed(len)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of row `y`, padding included.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Channels of pixel `(x, y)` in memory order.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = y as usize * self.stride + x as usize * 3;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    /// Repack into an `RgbImage`: tight rows, channels swapped to R, G, B.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let [b, g, r] = self.pixel(x, y);
            image::Rgb([r, g, b])
        })
    }
}

/// Rectangle in top-down pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle is non-empty and lies inside `width x height`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .x
                .checked_add(self.width)
                .is_some_and(|right| right <= width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= height)
    }
}
