//! Frame sources.
//!
//! Real capture devices live outside this crate: they only need to drive a
//! `FrameSink` (announce geometry, push bottom-up frames, stop). The built-in
//! synthetic source plays that role for tests and the `grab` tool.
//!
//! Sources are responsible for:
//! - Reporting frame geometry once before the first push
//! - Delivering whole frames in bottom-up row order from their own thread
//!
//! Sources MUST NOT:
//! - Assume a pushed frame is retained (the buffer keeps only the latest)
//! - Stop on a rejected frame

pub mod synthetic;

pub use synthetic::{SourceConfig, SourceHandle, SourceStats, SyntheticSource};
