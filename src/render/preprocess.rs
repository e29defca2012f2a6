use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MID: f32 = 128.0;

/// Gamma correction followed by a linear contrast stretch about mid-grey
///
/// Geometry is untouched; only channel values change. Alpha is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preprocess {
    /// Exponent applied to normalized channel values
    pub gamma: f32,
    /// Gain applied around 128 after gamma
    pub contrast: f32,
}

impl Default for Preprocess {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            contrast: 1.15,
        }
    }
}

impl Preprocess {
    /// Reject non-finite or non-positive parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("gamma", self.gamma), ("contrast", self.contrast)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidPreprocess { name, value });
            }
        }
        Ok(())
    }

    /// Per-channel lookup table
    pub fn lut(&self) -> [u8; 256] {
        let mut table = [0u8; 256];
        for (v, slot) in table.iter_mut().enumerate() {
            let corrected = 255.0 * (v as f32 / 255.0).powf(self.gamma);
            let stretched = (corrected - MID) * self.contrast + MID;
            *slot = stretched.clamp(0.0, 255.0).round() as u8;
        }
        table
    }

    /// Apply in place to a row-major RGBA buffer `width` pixels wide
    pub fn apply(&self, rgba: &mut [u8], width: usize) {
        if width == 0 || rgba.is_empty() {
            return;
        }
        let table = self.lut();
        rgba.par_chunks_mut(width * 4).for_each(|row| {
            for px in row.chunks_exact_mut(4) {
                px[0] = table[px[0] as usize];
                px[1] = table[px[1] as usize];
                px[2] = table[px[2] as usize];
            }
        });
    }
}
