use std::collections::HashSet;

use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintValue, DecodeHints, Exceptions, Luma8LuminanceSource,
    MultiFormatReader, Reader,
};

use crate::error::EngineError;
use crate::models::{CandidateFrame, Symbology};

use super::DecodeEngine;

const NAME: &str = "rxing";

/// Multi-symbology reader over a hybrid binarizer on the luminance plane
#[derive(Debug, Clone)]
pub struct MultiFormatEngine {
    formats: HashSet<BarcodeFormat>,
    try_harder: bool,
}

impl MultiFormatEngine {
    /// Restrict the reader to `symbologies`
    pub fn new(symbologies: &[Symbology], try_harder: bool) -> Self {
        Self {
            formats: symbologies.iter().map(|&s| barcode_format(s)).collect(),
            try_harder,
        }
    }

    fn hints(&self) -> DecodeHints {
        DecodeHints::default()
            .with(DecodeHintValue::TryHarder(self.try_harder))
            .with(DecodeHintValue::PossibleFormats(self.formats.clone()))
    }
}

/// rxing format for a symbology
pub fn barcode_format(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Qr => BarcodeFormat::QR_CODE,
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Itf => BarcodeFormat::ITF,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
    }
}

impl DecodeEngine for MultiFormatEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn decode(&self, frame: &CandidateFrame<'_>) -> Result<Option<String>, EngineError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(EngineError::Unsupported {
                engine: NAME,
                reason: "empty frame".to_string(),
            });
        }
        let source = Luma8LuminanceSource::new(frame.luma.to_vec(), frame.width, frame.height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = MultiFormatReader::default();

        match reader.decode_with_hints(&mut bitmap, &self.hints()) {
            Ok(result) => Ok(Some(result.getText().to_string())),
            Err(Exceptions::NotFoundException(..)) => Ok(None),
            Err(e) => Err(EngineError::Failed {
                engine: NAME,
                reason: e.to_string(),
            }),
        }
    }
}
