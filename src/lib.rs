//! invscan - photo decoding for inventory labels
//!
//! Takes a still photograph of a printed QR code or barcode, in any
//! orientation and at any reasonable scale, and extracts the payload.
//! The pipeline:
//!
//! 1. [`orientation::normalize`] decodes the image once and applies its
//!    EXIF orientation, producing an upright canonical bitmap.
//! 2. [`render::RasterSurface`] renders candidate frames over a
//!    scale x rotation grid into reused buffers.
//! 3. [`cascade::Cascade`] tries each decoding engine in order on a frame.
//! 4. [`Scanner`] walks the grid until a match, exhaustion, cancellation or
//!    deadline.
//!
//! ```no_run
//! use invscan::{CancelToken, RawImage, ScanConfig, Scanner};
//!
//! let scanner = Scanner::new(ScanConfig::from_env())?;
//! let raw = RawImage::from_path("label.jpg")?;
//! let report = scanner.scan(&raw, &CancelToken::new())?;
//! if let Some(text) = report.text() {
//!     println!("{text}");
//! }
//! # Ok::<(), invscan::ScanError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Decoding engines and the ordered cascade
pub mod cascade;
/// Scan configuration (defaults, environment, JSON)
pub mod config;
/// Debug switches for front ends
pub mod debug;
/// Error types
pub mod error;
/// Core data structures (RawImage, CandidateFrame, ScanReport, etc.)
pub mod models;
/// Orientation discovery and canonical bitmaps
pub mod orientation;
/// Grid walk, cancellation and reporting
pub mod pipeline;
/// Movement records for the inventory endpoint
pub mod record;
/// Candidate frame rendering
pub mod render;
/// Dataset helpers for the CLI and benches
pub mod tools;
/// Pixel helpers (luminance)
pub mod utils;

pub use cascade::{Cascade, DecodeEngine, PlatformDetector};
pub use config::{GridOrder, ScanConfig};
pub use error::{ConfigError, EngineError, RecordError, ScanError};
pub use models::{
    CandidateFrame, CandidateKey, DecodeResult, RawImage, Rotation, ScanOutcome, ScanReport,
    Symbology,
};
pub use orientation::{CanonicalBitmap, Orientation, OrientationSource, OrientationStrategy, normalize};
pub use pipeline::{CancelToken, Scanner, scan_bytes, scan_path};
pub use record::{ApiResponse, FormDefaults, MovementRecord};
pub use render::{Preprocess, RasterSurface, RenderOptions};
