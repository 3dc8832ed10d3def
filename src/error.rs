use thiserror::Error;

/// Errors surfaced by the frame buffer and its readers.
///
/// "No frame yet" is not an error: readers return `Ok(None)` for it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame geometry {width}x{height} ({bytes_per_pixel} bytes/pixel)")]
    InvalidGeometry {
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
    },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("frame length mismatch: expected {expected} bytes, got {actual}")]
    BufferLengthMismatch { expected: usize, actual: usize },
    #[error("frame buffer is not allocated")]
    NotAllocated,
    #[error("unsupported pixel format: {0} bytes/pixel (expected 3)")]
    UnsupportedPixelFormat(u32),
    #[error("failed to allocate {0} bytes for destination raster")]
    AllocationFailure(usize),
    #[error("video source error: {0}")]
    Source(String),
}

pub type Result<T, E = FrameError> = std::result::Result<T, E>;

pub(crate) fn invalid(message: impl Into<String>) -> FrameError {
    FrameError::InvalidParameter(message.into())
}

/// Zero-filled byte vector whose allocation failure is reported instead of aborting.
pub(crate) fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| FrameError::AllocationFailure(len))?;
    bytes.resize(len, 0);
    Ok(bytes)
}
