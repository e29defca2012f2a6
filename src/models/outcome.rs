use std::time::Duration;

use serde::Serialize;

use super::CandidateKey;
use crate::orientation::{Orientation, OrientationSource};

/// A decoded payload and the cascade stage that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeResult {
    /// Raw decoded payload; schema parsing is the caller's business
    pub text: String,
    /// Name of the engine that matched (diagnostics only)
    pub engine: &'static str,
    /// Grid cell the match came from
    pub candidate: CandidateKey,
}

/// Terminal state of one scan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// An engine decoded a payload
    Matched(DecodeResult),
    /// Every grid cell was tried without a match; ask for a retake
    Exhausted,
    /// The caller cancelled before a match was produced
    Cancelled,
    /// The configured time budget ran out before a match was produced
    DeadlineExceeded,
}

impl ScanOutcome {
    /// True for [`ScanOutcome::Matched`]
    pub fn is_match(&self) -> bool {
        matches!(self, ScanOutcome::Matched(_))
    }

    /// Borrow the decode result, if any
    pub fn result(&self) -> Option<&DecodeResult> {
        match self {
            ScanOutcome::Matched(result) => Some(result),
            _ => None,
        }
    }

    /// Take the decode result, if any
    pub fn into_result(self) -> Option<DecodeResult> {
        match self {
            ScanOutcome::Matched(result) => Some(result),
            _ => None,
        }
    }
}

/// Outcome of a scan plus what it took to get there
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Terminal state
    pub outcome: ScanOutcome,
    /// Orientation that was applied to reach upright pixel space
    pub orientation: Orientation,
    /// Where the orientation came from
    pub orientation_source: OrientationSource,
    /// Canonical (upright) width
    pub canonical_width: u32,
    /// Canonical (upright) height
    pub canonical_height: u32,
    /// Grid cells rendered and decoded, in order
    pub attempts: Vec<CandidateKey>,
    /// Wall-clock time spent, normalization included
    pub elapsed: Duration,
}

impl ScanReport {
    /// Decoded text, if the scan matched
    pub fn text(&self) -> Option<&str> {
        self.outcome.result().map(|r| r.text.as_str())
    }

    /// Matching engine, if the scan matched
    pub fn engine(&self) -> Option<&'static str> {
        self.outcome.result().map(|r| r.engine)
    }
}
