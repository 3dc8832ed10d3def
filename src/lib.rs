//! Frame Grabber
//!
//! Latest-frame buffer for a live 24-bit video stream, with readers that turn
//! the stored frame into top-down images.
//!
//! # Architecture
//!
//! A video source delivers frames bottom-up (memory row 0 is the bottom scan
//! line) from its own thread. The buffer keeps only the most recent frame;
//! every reader takes the same lock as the writer, so a reader always sees one
//! whole frame and never aliases the stored bytes.
//!
//! # Module Structure
//!
//! - `frame`: Frame geometry and the latest-frame buffer
//! - `raster`: Top-down destination images with 4-byte aligned rows
//! - `orient`: Bottom-up to top-down orientation correction
//! - `resample`: Block-average, nearest, bilinear and bicubic resamplers
//! - `export`: Raw byte extraction
//! - `session`: The boundary a video source drives
//! - `ingest`: Frame sources (synthetic `stub://`)
//! - `config`: JSON file + environment configuration for the `grab` tool

pub mod config;
pub mod error;
pub mod export;
pub mod frame;
pub mod ingest;
pub mod orient;
pub mod raster;
pub mod resample;
pub mod session;

pub use config::GrabberConfig;
pub use error::{FrameError, Result};
pub use export::{ExportedFrame, RawExporter};
pub use frame::{FrameBuffer, FrameGeometry, FrameView, RGB24_BYTES_PER_PIXEL};
pub use ingest::{SourceConfig, SourceHandle, SourceStats, SyntheticSource};
pub use orient::{CaptureSurface, OrientationCorrector, Strategy};
pub use raster::{Raster, Rect};
pub use resample::{block_average, resize, ResizeFilter, Resampler};
pub use session::{CaptureSession, FrameSink, SessionStats};
