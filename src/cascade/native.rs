use std::sync::Arc;

use crate::error::EngineError;
use crate::models::{CandidateFrame, Symbology};

use super::DecodeEngine;

/// A barcode service provided by the host platform (OS or hardware)
///
/// Implementations that are asynchronous underneath must block inside
/// [`PlatformDetector::detect`].
pub trait PlatformDetector: Send + Sync {
    /// Symbologies the service can recognise
    fn supported_formats(&self) -> Result<Vec<Symbology>, EngineError>;

    /// Raw values of every code found in `frame`, restricted to `formats`
    fn detect(
        &self,
        frame: &CandidateFrame<'_>,
        formats: &[Symbology],
    ) -> Result<Vec<String>, EngineError>;
}

/// Cascade stage backed by a [`PlatformDetector`]
pub struct NativeEngine {
    detector: Arc<dyn PlatformDetector>,
    formats: Vec<Symbology>,
}

impl NativeEngine {
    /// Intersect `allowed` with what the detector supports
    ///
    /// If the detector cannot report its formats the whole allow-list is
    /// used. Returns `None` when the intersection is empty.
    pub fn negotiate(detector: Arc<dyn PlatformDetector>, allowed: &[Symbology]) -> Option<Self> {
        let formats: Vec<Symbology> = match detector.supported_formats() {
            Ok(supported) => allowed
                .iter()
                .copied()
                .filter(|s| supported.contains(s))
                .collect(),
            Err(e) => {
                log::debug!("platform detector did not report formats ({e}), using allow-list");
                allowed.to_vec()
            }
        };
        if formats.is_empty() {
            return None;
        }
        Some(Self { detector, formats })
    }

    /// Symbologies the detector will be asked for
    pub fn formats(&self) -> &[Symbology] {
        &self.formats
    }
}

impl DecodeEngine for NativeEngine {
    fn name(&self) -> &'static str {
        "native"
    }

    fn decode(&self, frame: &CandidateFrame<'_>) -> Result<Option<String>, EngineError> {
        let found = self.detector.detect(frame, &self.formats)?;
        Ok(found.into_iter().find(|raw| !raw.is_empty()))
    }
}
