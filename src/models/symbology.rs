use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Barcode/2D-code encoding standards the cascade may look for
///
/// Textual names follow the platform barcode detector convention
/// (`qr_code`, `ean_13`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    /// QR Code (Model 2)
    #[serde(rename = "qr_code")]
    Qr,
    /// EAN-13 retail barcode
    #[serde(rename = "ean_13")]
    Ean13,
    /// Code 128
    #[serde(rename = "code_128")]
    Code128,
    /// Code 39
    #[serde(rename = "code_39")]
    Code39,
    /// Interleaved 2 of 5
    #[serde(rename = "itf")]
    Itf,
    /// UPC-A
    #[serde(rename = "upc_a")]
    UpcA,
    /// UPC-E
    #[serde(rename = "upc_e")]
    UpcE,
}

impl Symbology {
    /// Default allow-list, in the order inventory labels are most likely printed
    pub const ALL: [Symbology; 7] = [
        Symbology::Qr,
        Symbology::Code128,
        Symbology::Ean13,
        Symbology::Code39,
        Symbology::Itf,
        Symbology::UpcA,
        Symbology::UpcE,
    ];

    /// Platform-detector style name
    pub fn as_str(self) -> &'static str {
        match self {
            Symbology::Qr => "qr_code",
            Symbology::Ean13 => "ean_13",
            Symbology::Code128 => "code_128",
            Symbology::Code39 => "code_39",
            Symbology::Itf => "itf",
            Symbology::UpcA => "upc_a",
            Symbology::UpcE => "upc_e",
        }
    }

    /// Parse a comma separated list such as `qr_code,ean_13`
    pub fn parse_list(list: &str) -> Result<Vec<Symbology>, ConfigError> {
        let mut out = Vec::new();
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let sym: Symbology = token.parse()?;
            if !out.contains(&sym) {
                out.push(sym);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "qr_code" | "qr" | "qrcode" => Ok(Symbology::Qr),
            "ean_13" | "ean13" => Ok(Symbology::Ean13),
            "code_128" | "code128" => Ok(Symbology::Code128),
            "code_39" | "code39" => Ok(Symbology::Code39),
            "itf" => Ok(Symbology::Itf),
            "upc_a" | "upca" => Ok(Symbology::UpcA),
            "upc_e" | "upce" => Ok(Symbology::UpcE),
            _ => Err(ConfigError::UnknownSymbology(s.to_string())),
        }
    }
}
