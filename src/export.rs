//! Untyped byte exports of the latest frame.
//!
//! `export_raw` hands back storage as delivered (bottom-up). The top-down
//! variants exist for consumers that want plain bytes instead of a `Raster`;
//! `export_raw_top_down` is the slow copy-then-reverse path and doubles as a
//! reference for validating the in-lock readers.

use crate::error::{invalid, Result};
use crate::frame::FrameBuffer;
use crate::orient::reverse_rows;
use crate::resample::downscale_by_block;

/// Bytes of a top-down export together with their layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, padding included.
    pub stride: usize,
    pub bytes: Vec<u8>,
}

pub struct RawExporter<'a> {
    buffer: &'a FrameBuffer,
}

impl<'a> RawExporter<'a> {
    pub fn new(buffer: &'a FrameBuffer) -> Self {
        Self { buffer }
    }

    /// Storage verbatim, bottom-up, `height * stride` bytes.
    pub fn export_raw(&self) -> Option<Vec<u8>> {
        self.buffer.with_read_lock(|view| view.data().to_vec())
    }

    /// Storage with rows reversed into top-down order.
    ///
    /// Copies the whole buffer under the lock, then reverses one row at a time
    /// after releasing it.
    pub fn export_raw_top_down(&self) -> Option<Vec<u8>> {
        let (stride, bytes) = self
            .buffer
            .with_read_lock(|view| (view.stride(), view.data().to_vec()))?;
        Some(reverse_rows(&bytes, stride))
    }

    /// Block-average by `n` and flip in one pass; rows padded to 4 bytes.
    pub fn export_downscaled_top_down(&self, n: u32) -> Result<Option<ExportedFrame>> {
        if n == 0 {
            return Err(invalid("block factor must be positive"));
        }
        self.buffer
            .with_read_lock(|view| {
                let raster = downscale_by_block(&view, n)?;
                Ok(ExportedFrame {
                    width: raster.width(),
                    height: raster.height(),
                    stride: raster.stride(),
                    bytes: raster.into_data(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameGeometry;

    fn buffer_with(width: u32, height: u32, bytes_per_pixel: u32, raw: &[u8]) -> FrameBuffer {
        let buffer = FrameBuffer::new();
        buffer
            .allocate(FrameGeometry::new(width, height, bytes_per_pixel).unwrap())
            .unwrap();
        buffer.push(raw).unwrap();
        buffer
    }

    #[test]
    fn no_frame_exports_nothing() {
        let buffer = FrameBuffer::new();
        let exporter = RawExporter::new(&buffer);
        assert!(exporter.export_raw().is_none());
        assert!(exporter.export_raw_top_down().is_none());
        assert!(exporter.export_downscaled_top_down(2).unwrap().is_none());
    }

    #[test]
    fn raw_export_is_verbatim() {
        let raw: Vec<u8> = (0..24).collect();
        let buffer = buffer_with(2, 4, 3, &raw);
        assert_eq!(RawExporter::new(&buffer).export_raw().unwrap(), raw);
    }

    #[test]
    fn top_down_export_reverses_rows() {
        let raw: Vec<u8> = (0..12).collect();
        let buffer = buffer_with(1, 3, 4, &raw);
        let top_down = RawExporter::new(&buffer).export_raw_top_down().unwrap();
        assert_eq!(top_down, vec![8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3]);
    }

    #[test]
    fn downscaled_export_reports_layout() {
        let buffer = buffer_with(4, 2, 3, &[100u8; 24]);
        let export = RawExporter::new(&buffer)
            .export_downscaled_top_down(2)
            .unwrap()
            .unwrap();
        assert_eq!((export.width, export.height, export.stride), (2, 1, 8));
        assert_eq!(export.bytes, vec![100, 100, 100, 100, 100, 100, 0, 0]);
    }

    #[test]
    fn downscaled_export_rejects_bad_factor() {
        let buffer = buffer_with(4, 2, 3, &[0u8; 24]);
        let exporter = RawExporter::new(&buffer);
        assert!(exporter.export_downscaled_top_down(3).is_err());
        assert!(exporter.export_downscaled_top_down(0).is_err());
    }
}
