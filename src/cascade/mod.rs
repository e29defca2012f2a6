//! Decoder cascade
//!
//! An ordered list of engines is tried on each candidate frame. The first
//! engine to return a non-empty payload wins and later engines are not run.
//! Engine faults are logged and count as a no-match.

/// rxing multi-format reader
pub mod multi_format;
/// Platform barcode service adapter
pub mod native;
/// rqrr QR-only reader
pub mod qr_only;

use std::sync::Arc;

use crate::config::ScanConfig;
use crate::error::EngineError;
use crate::models::{CandidateFrame, DecodeResult, Symbology};

pub use multi_format::MultiFormatEngine;
pub use native::{NativeEngine, PlatformDetector};
pub use qr_only::QrOnlyEngine;

/// One decoding strategy
///
/// `Ok(None)` means nothing was found in the frame. Errors are reserved for
/// engine faults; the cascade absorbs them.
pub trait DecodeEngine: Send + Sync {
    /// Short diagnostic name reported with a match
    fn name(&self) -> &'static str;

    /// Try to decode a payload from `frame`
    fn decode(&self, frame: &CandidateFrame<'_>) -> Result<Option<String>, EngineError>;
}

/// Fixed, ordered list of engines
pub struct Cascade {
    engines: Vec<Box<dyn DecodeEngine>>,
}

impl Cascade {
    /// Build the standard cascade for `config`
    ///
    /// Order: platform detector (when supplied and it supports at least one
    /// allowed symbology), multi-format reader, QR-only reader (when QR is
    /// allowed). Capability probing happens here, once.
    pub fn negotiate(config: &ScanConfig, platform: Option<Arc<dyn PlatformDetector>>) -> Self {
        let mut engines: Vec<Box<dyn DecodeEngine>> = Vec::with_capacity(3);

        if let Some(detector) = platform {
            match NativeEngine::negotiate(detector, &config.symbologies) {
                Some(engine) => engines.push(Box::new(engine)),
                None => log::debug!("platform detector supports none of the allowed symbologies"),
            }
        }
        engines.push(Box::new(MultiFormatEngine::new(
            &config.symbologies,
            config.try_harder,
        )));
        if config.symbologies.contains(&Symbology::Qr) {
            engines.push(Box::new(QrOnlyEngine::new()));
        }

        let cascade = Self { engines };
        log::debug!("cascade: {:?}", cascade.engine_names());
        cascade
    }

    /// Use a caller-supplied engine list as-is
    pub fn from_engines(engines: Vec<Box<dyn DecodeEngine>>) -> Self {
        Self { engines }
    }

    /// Engine names in call order
    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Number of engines
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// True when no engine is configured
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Run every engine in order until one matches
    pub fn decode(&self, frame: &CandidateFrame<'_>) -> Option<DecodeResult> {
        match self.decode_until(frame, || None::<()>) {
            Ok(result) => result,
            Err(()) => None,
        }
    }

    /// Like [`Cascade::decode`], but `stop` is polled before each engine
    ///
    /// Returns `Err(reason)` as soon as `stop` yields a reason and no engine
    /// has matched yet.
    pub fn decode_until<S>(
        &self,
        frame: &CandidateFrame<'_>,
        mut stop: impl FnMut() -> Option<S>,
    ) -> Result<Option<DecodeResult>, S> {
        for engine in &self.engines {
            if let Some(reason) = stop() {
                return Err(reason);
            }
            match engine.decode(frame) {
                Ok(Some(text)) if !text.is_empty() => {
                    return Ok(Some(DecodeResult {
                        text,
                        engine: engine.name(),
                        candidate: frame.key,
                    }));
                }
                Ok(_) => {}
                Err(e) => log::trace!("{} on {}: {e}", engine.name(), frame.key),
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for Cascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cascade")
            .field("engines", &self.engine_names())
            .finish()
    }
}
