use rqrr::PreparedImage;

use crate::error::EngineError;
use crate::models::CandidateFrame;

use super::DecodeEngine;

const NAME: &str = "rqrr";

/// QR-only reader over the luminance plane
///
/// Reads `frame.luma`, the preprocessed and flattened luminance, never the
/// RGBA buffer. Takes no configuration. Every detected grid is tried; the first one that
/// decodes wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrOnlyEngine;

impl QrOnlyEngine {
    /// Create the engine
    pub fn new() -> Self {
        Self
    }
}

impl DecodeEngine for QrOnlyEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn decode(&self, frame: &CandidateFrame<'_>) -> Result<Option<String>, EngineError> {
        let (w, h) = (frame.width as usize, frame.height as usize);
        if w == 0 || h == 0 {
            return Ok(None);
        }
        let luma = frame.luma;
        let mut img = PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);
        let grids = img.detect_grids();
        if grids.is_empty() {
            return Ok(None);
        }

        let mut last_err = None;
        for grid in &grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(Some(content)),
                Err(e) => last_err = Some(e),
            }
        }
        Err(EngineError::Failed {
            engine: NAME,
            reason: format!("{} grid(s) found, none decoded: {last_err:?}", grids.len()),
        })
    }
}
