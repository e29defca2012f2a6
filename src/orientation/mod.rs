//! Orientation normalization
//!
//! Turns encoded bytes into a [`CanonicalBitmap`] in upright pixel space.
//! The image decoder's own orientation metadata is preferred; JPEG input
//! additionally gets a hand-walked EXIF read when the decoder reports nothing.
//! Metadata problems never fail a request: they fall back to identity.

/// Hand-walked JPEG APP1/EXIF reader
pub mod exif;

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::models::RawImage;

pub use exif::{read_exif_orientation, read_orientation_tag};

/// EXIF orientation (tag 0x0112): how stored pixels map to the upright image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u16")]
pub enum Orientation {
    /// 1: stored upright
    #[default]
    Identity,
    /// 2: mirrored left-right
    FlipHorizontal,
    /// 3: upside down
    Rotate180,
    /// 4: mirrored top-bottom
    FlipVertical,
    /// 5: mirrored along the main diagonal (90 CW + mirror)
    Transpose,
    /// 6: needs a 90 degree clockwise turn
    Rotate90,
    /// 7: mirrored along the anti-diagonal (270 CW + mirror)
    Transverse,
    /// 8: needs a 270 degree clockwise turn
    Rotate270,
}

impl Orientation {
    /// Map an EXIF tag value, `None` outside 1..=8
    pub fn from_tag(tag: u16) -> Option<Self> {
        Some(match tag {
            1 => Orientation::Identity,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            _ => return None,
        })
    }

    /// EXIF tag value (1..=8)
    pub fn tag(self) -> u16 {
        match self {
            Orientation::Identity => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90 => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate270 => 8,
        }
    }

    /// Orientations 5-8 exchange width and height
    pub fn swaps_dimensions(self) -> bool {
        self.tag() >= 5
    }

    /// Upright size of a stored `width` x `height` image
    pub fn upright_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Transform stored pixels into upright pixel space
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Identity => image,
            Orientation::FlipHorizontal => image.fliph(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::FlipVertical => image.flipv(),
            Orientation::Transpose => image.rotate90().fliph(),
            Orientation::Rotate90 => image.rotate90(),
            Orientation::Transverse => image.rotate270().fliph(),
            Orientation::Rotate270 => image.rotate270(),
        }
    }

    fn from_decoder(value: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation as Decoded;
        match value {
            Decoded::NoTransforms => Orientation::Identity,
            Decoded::FlipHorizontal => Orientation::FlipHorizontal,
            Decoded::Rotate180 => Orientation::Rotate180,
            Decoded::FlipVertical => Orientation::FlipVertical,
            Decoded::Rotate90FlipH => Orientation::Transpose,
            Decoded::Rotate90 => Orientation::Rotate90,
            Decoded::Rotate270FlipH => Orientation::Transverse,
            Decoded::Rotate270 => Orientation::Rotate270,
            #[allow(unreachable_patterns)]
            _ => Orientation::Identity,
        }
    }
}

impl From<Orientation> for u16 {
    fn from(value: Orientation) -> Self {
        value.tag()
    }
}

/// How orientation metadata is discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationStrategy {
    /// Ask the image decoder, falling back to the JPEG EXIF walk
    #[default]
    Native,
    /// Only the hand-walked JPEG EXIF block
    ExifOnly,
}

impl std::str::FromStr for OrientationStrategy {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(OrientationStrategy::Native),
            "exif" | "exif_only" => Ok(OrientationStrategy::ExifOnly),
            other => Err(crate::error::ConfigError::UnknownVariant {
                kind: "orientation strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// Where the applied orientation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSource {
    /// Reported by the image decoder
    Decoder,
    /// Read from the JPEG APP1/EXIF segment
    JpegExif,
}

/// Upright raster derived once per [`RawImage`]
#[derive(Debug, Clone)]
pub struct CanonicalBitmap {
    image: RgbaImage,
    orientation: Orientation,
    source: OrientationSource,
    stored_width: u32,
    stored_height: u32,
}

impl CanonicalBitmap {
    /// Wrap an already upright image
    pub fn from_upright(image: RgbaImage) -> Self {
        let (w, h) = image.dimensions();
        Self {
            image,
            orientation: Orientation::Identity,
            source: OrientationSource::Decoder,
            stored_width: w,
            stored_height: h,
        }
    }

    /// Upright width
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Upright height
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width and height as stored in the file, before orientation
    pub fn stored_dimensions(&self) -> (u32, u32) {
        (self.stored_width, self.stored_height)
    }

    /// Orientation that was applied
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Where the orientation came from
    pub fn source(&self) -> OrientationSource {
        self.source
    }

    /// Upright RGBA pixels
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Decode `raw` and bring it into upright pixel space
pub fn normalize(raw: &RawImage, strategy: OrientationStrategy) -> Result<CanonicalBitmap, ScanError> {
    if raw.is_empty() {
        return Err(ScanError::EmptyInput);
    }
    let undecodable = |source: image::ImageError| ScanError::UndecodableInput {
        mime: raw.mime().map(str::to_string),
        source,
    };

    let (stored, orientation, source) = match strategy {
        OrientationStrategy::Native => decode_native(raw).map_err(undecodable)?,
        OrientationStrategy::ExifOnly => {
            let stored = open_reader(raw)
                .and_then(|reader| reader.decode())
                .map_err(undecodable)?;
            let orientation = read_exif_orientation(raw.bytes());
            (stored, orientation, OrientationSource::JpegExif)
        }
    };

    let (stored_width, stored_height) = (stored.width(), stored.height());
    let upright = orientation.apply(stored).into_rgba8();
    log::debug!(
        "normalized {}x{} -> {}x{} (orientation {} via {:?})",
        stored_width,
        stored_height,
        upright.width(),
        upright.height(),
        orientation.tag(),
        source
    );

    Ok(CanonicalBitmap {
        image: upright,
        orientation,
        source,
        stored_width,
        stored_height,
    })
}

fn open_reader(raw: &RawImage) -> Result<ImageReader<Cursor<&[u8]>>, image::ImageError> {
    let mut reader = ImageReader::new(Cursor::new(raw.bytes()));
    if let Some(format) = raw.format_hint() {
        reader.set_format(format);
    }
    // Content sniffing wins over a wrong declared type
    Ok(reader.with_guessed_format()?)
}

fn decode_native(
    raw: &RawImage,
) -> Result<(DynamicImage, Orientation, OrientationSource), image::ImageError> {
    let mut decoder = open_reader(raw)?.into_decoder()?;
    let reported = match decoder.orientation() {
        Ok(value) => Some(Orientation::from_decoder(value)),
        Err(err) => {
            log::debug!("decoder orientation unavailable: {err}");
            None
        }
    };
    let image = DynamicImage::from_decoder(decoder)?;

    let (orientation, source) = match reported {
        Some(o) if o != Orientation::Identity => (o, OrientationSource::Decoder),
        // Decoders may not surface EXIF for every JPEG flavour
        _ => match read_exif_orientation(raw.bytes()) {
            Orientation::Identity if reported.is_some() => {
                (Orientation::Identity, OrientationSource::Decoder)
            }
            o => (o, OrientationSource::JpegExif),
        },
    };
    Ok((image, orientation, source))
}
