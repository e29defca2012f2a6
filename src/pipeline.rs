//! Scan orchestration
//!
//! One scan normalizes the raw image once, then walks the scale x rotation
//! grid. Each cell is rendered into the raster surface and handed to the
//! cascade. The first match ends the scan.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cascade::{Cascade, PlatformDetector};
use crate::config::{GridOrder, ScanConfig};
use crate::error::ScanError;
use crate::models::{CandidateKey, RawImage, ScanOutcome, ScanReport};
use crate::orientation::{self, CanonicalBitmap};
use crate::render::{RasterSurface, RenderOptions};

/// Cooperative cancellation flag shared between a scan and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once [`CancelToken::cancel`] has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Configured scanner; cheap to share across threads
///
/// Holds no per-scan state. Each call to [`Scanner::scan`] allocates its own
/// [`RasterSurface`]; use [`Scanner::scan_with_surface`] to reuse one.
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    cascade: Cascade,
}

impl Scanner {
    /// Validate `config` and build the standard cascade
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let cascade = Cascade::negotiate(&config, None);
        Ok(Self { config, cascade })
    }

    /// Like [`Scanner::new`], with a platform detector at the head of the cascade
    pub fn with_platform_detector(
        config: ScanConfig,
        detector: Arc<dyn PlatformDetector>,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let cascade = Cascade::negotiate(&config, Some(detector));
        Ok(Self { config, cascade })
    }

    /// Use a caller-built cascade
    pub fn with_cascade(config: ScanConfig, cascade: Cascade) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config, cascade })
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Active cascade
    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    /// Grid cells in visiting order
    pub fn grid(&self) -> Vec<CandidateKey> {
        let ScanConfig {
            scales, rotations, ..
        } = &self.config;
        let mut grid = Vec::with_capacity(scales.len() * rotations.len());
        match self.config.grid_order {
            GridOrder::RotationsFirst => {
                for &scale in scales {
                    grid.extend(rotations.iter().map(|&r| CandidateKey::new(scale, r)));
                }
            }
            GridOrder::ScalesFirst => {
                for &rotation in rotations {
                    grid.extend(scales.iter().map(|&s| CandidateKey::new(s, rotation)));
                }
            }
        }
        grid
    }

    /// Scan `raw` with a fresh raster surface
    pub fn scan(&self, raw: &RawImage, cancel: &CancelToken) -> Result<ScanReport, ScanError> {
        let mut surface = RasterSurface::new();
        self.scan_with_surface(raw, cancel, &mut surface)
    }

    /// Scan `raw`, rendering into a caller-owned surface
    pub fn scan_with_surface(
        &self,
        raw: &RawImage,
        cancel: &CancelToken,
        surface: &mut RasterSurface,
    ) -> Result<ScanReport, ScanError> {
        let state = ScanState::start(cancel, self.config.time_budget());

        if let Some(limit) = self.config.max_input_bytes {
            if raw.len() > limit {
                return Err(ScanError::InputTooLarge {
                    size: raw.len(),
                    limit,
                });
            }
        }

        let canonical = orientation::normalize(raw, self.config.orientation)?;
        let mut attempts = Vec::with_capacity(self.config.grid_len());
        let outcome = self.walk_grid(&canonical, surface, &state, &mut attempts)?;

        let elapsed = state.elapsed();
        match &outcome {
            ScanOutcome::Matched(result) => log::info!(
                "matched via {} at {} after {} frame(s) in {elapsed:?}",
                result.engine,
                result.candidate,
                attempts.len()
            ),
            other => log::debug!("scan ended {other:?} after {} frame(s)", attempts.len()),
        }

        Ok(ScanReport {
            outcome,
            orientation: canonical.orientation(),
            orientation_source: canonical.source(),
            canonical_width: canonical.width(),
            canonical_height: canonical.height(),
            attempts,
            elapsed,
        })
    }

    fn walk_grid(
        &self,
        canonical: &CanonicalBitmap,
        surface: &mut RasterSurface,
        state: &ScanState<'_>,
        attempts: &mut Vec<CandidateKey>,
    ) -> Result<ScanOutcome, ScanError> {
        let options: RenderOptions = self.config.render_options();

        for key in self.grid() {
            if let Some(stop) = state.interrupted() {
                return Ok(stop);
            }
            let frame = surface.render(canonical, key, &options)?;
            attempts.push(key);
            log::debug!("frame {} {}x{}", key, frame.width, frame.height);

            match self.cascade.decode_until(&frame, || state.interrupted()) {
                Ok(Some(result)) => return Ok(ScanOutcome::Matched(result)),
                Ok(None) => {}
                Err(stop) => return Ok(stop),
            }
        }
        Ok(ScanOutcome::Exhausted)
    }
}

/// Clock and cancellation for one scan
struct ScanState<'a> {
    cancel: &'a CancelToken,
    started: Instant,
    deadline: Option<Instant>,
}

impl<'a> ScanState<'a> {
    fn start(cancel: &'a CancelToken, budget: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            cancel,
            started,
            deadline: budget.map(|b| started + b),
        }
    }

    /// Terminal outcome if the scan must stop now
    fn interrupted(&self) -> Option<ScanOutcome> {
        if self.cancel.is_cancelled() {
            return Some(ScanOutcome::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ScanOutcome::DeadlineExceeded),
            _ => None,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// One-shot scan of in-memory bytes with the default configuration
pub fn scan_bytes(bytes: &[u8], mime: Option<&str>) -> Result<ScanReport, ScanError> {
    let mut raw = RawImage::new(bytes);
    if let Some(mime) = mime {
        raw = raw.with_mime(mime);
    }
    Scanner::new(ScanConfig::default())?.scan(&raw, &CancelToken::new())
}

/// One-shot scan of an image file with the default configuration
pub fn scan_path<P: AsRef<Path>>(path: P) -> Result<ScanReport, ScanError> {
    let raw = RawImage::from_path(path)?;
    Scanner::new(ScanConfig::default())?.scan(&raw, &CancelToken::new())
}
