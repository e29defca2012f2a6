use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Clockwise right-angle rotation applied to a candidate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub enum Rotation {
    /// No rotation
    Deg0,
    /// Quarter turn clockwise
    Deg90,
    /// Half turn
    Deg180,
    /// Three quarter turns clockwise
    Deg270,
}

impl Rotation {
    /// All four rotations in ladder order
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Angle in degrees (0, 90, 180 or 270)
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Build from any multiple of 90 degrees; negative angles turn counter-clockwise
    pub fn from_degrees(degrees: i64) -> Result<Self, ConfigError> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(ConfigError::InvalidRotation(degrees)),
        }
    }

    /// Quarter turns swap width and height
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Output size of a `width` x `height` buffer after this rotation
    pub fn rotated_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Parse a comma separated list of degrees such as `0,90,180,270`
    pub fn parse_list(list: &str) -> Result<Vec<Rotation>, ConfigError> {
        let mut out = Vec::new();
        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let degrees = token.parse::<i64>().map_err(|_| ConfigError::UnknownVariant {
                kind: "rotation",
                value: token.to_string(),
            })?;
            let rotation = Rotation::from_degrees(degrees)?;
            if !out.contains(&rotation) {
                out.push(rotation);
            }
        }
        Ok(out)
    }
}

impl TryFrom<i64> for Rotation {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rotation::from_degrees(value)
    }
}

impl From<Rotation> for u16 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}deg", self.degrees())
    }
}

/// One cell of the scale x rotation search grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateKey {
    /// Scale factor applied to the canonical bitmap
    pub scale: f32,
    /// Rotation applied after scaling
    pub rotation: Rotation,
}

impl CandidateKey {
    /// Create a grid key
    pub fn new(scale: f32, rotation: Rotation) -> Self {
        Self { scale, rotation }
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{:.2}@{}", self.scale, self.rotation)
    }
}

/// A rendered candidate, borrowed from the raster surface that produced it
///
/// `rgba` holds `width * height * 4` bytes, `luma` holds `width * height`.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFrame<'a> {
    /// Grid cell this frame was rendered for
    pub key: CandidateKey,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Preprocessed RGBA pixels, row-major
    pub rgba: &'a [u8],
    /// Luminance plane derived from `rgba`
    pub luma: &'a [u8],
}

impl<'a> CandidateFrame<'a> {
    /// Wrap existing buffers as a frame
    pub fn new(key: CandidateKey, width: u32, height: u32, rgba: &'a [u8], luma: &'a [u8]) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * 4);
        debug_assert_eq!(luma.len(), width as usize * height as usize);
        Self {
            key,
            width,
            height,
            rgba,
            luma,
        }
    }

    /// Pixel count
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Copy the frame into an owned image (for dumps and diagnostics)
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.to_vec())
    }
}
