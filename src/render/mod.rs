//! Render transform stage
//!
//! Produces candidate frames from a canonical bitmap: scale, rotate about the
//! centre by a right angle, flatten onto white, preprocess, and derive the
//! luminance plane. All
//! buffers live in a [`RasterSurface`] that is reused between candidates, so
//! only one frame exists at a time.

/// Gamma/contrast lookup table
pub mod preprocess;

use fast_image_resize as fr;
use rayon::prelude::*;

use crate::error::ScanError;
use crate::models::{CandidateFrame, CandidateKey, Rotation};
use crate::orientation::CanonicalBitmap;
use crate::utils::grayscale::rgba_to_luma_into;

pub use preprocess::Preprocess;

/// Smallest width/height a candidate is rendered at
pub const DEFAULT_MIN_DIMENSION: u32 = 240;

/// Per-render settings taken from the scan configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Floor applied to each scaled dimension
    pub min_dimension: u32,
    /// Optional gamma/contrast pass
    pub preprocess: Option<Preprocess>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_dimension: DEFAULT_MIN_DIMENSION,
            preprocess: Some(Preprocess::default()),
        }
    }
}

/// Scaled size before rotation, each side floored at `min_dimension`
pub fn target_size(width: u32, height: u32, scale: f32, min_dimension: u32) -> (u32, u32) {
    let scaled = |side: u32| ((side as f64 * scale as f64).round() as u32).max(min_dimension);
    (scaled(width), scaled(height))
}

/// Reusable raster buffers for candidate frames
///
/// Every render rewrites every byte of the frame it returns, so nothing from
/// a previous candidate can leak into the next decode attempt.
pub struct RasterSurface {
    scaled: Vec<u8>,
    rgba: Vec<u8>,
    luma: Vec<u8>,
    resizer: fr::Resizer,
    resize_options: fr::ResizeOptions,
    renders: usize,
}

impl RasterSurface {
    /// Create an empty surface; buffers grow on first use
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a surface pre-sized for frames of up to `pixels` pixels
    pub fn with_capacity(pixels: usize) -> Self {
        Self {
            scaled: Vec::with_capacity(pixels * 4),
            rgba: Vec::with_capacity(pixels * 4),
            luma: Vec::with_capacity(pixels),
            resizer: fr::Resizer::new(),
            resize_options: fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
            renders: 0,
        }
    }

    /// Largest frame (in pixels) the surface can hold without reallocating
    pub fn capacity_pixels(&self) -> usize {
        self.luma.capacity()
    }

    /// Number of frames rendered since creation
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Drop frame contents, keeping capacity
    pub fn clear(&mut self) {
        self.scaled.clear();
        self.rgba.clear();
        self.luma.clear();
    }

    /// Render the candidate for `key` from `canonical`
    pub fn render(
        &mut self,
        canonical: &CanonicalBitmap,
        key: CandidateKey,
        options: &RenderOptions,
    ) -> Result<CandidateFrame<'_>, ScanError> {
        let (cw, ch) = (canonical.width(), canonical.height());
        let (tw, th) = target_size(cw, ch, key.scale, options.min_dimension);
        self.scale_into(canonical, tw, th)?;

        let (fw, fh) = key.rotation.rotated_size(tw, th);
        let frame_len = fw as usize * fh as usize * 4;
        self.rgba.resize(frame_len, 0);
        rotate_into(&self.scaled, tw as usize, th as usize, key.rotation, &mut self.rgba);
        flatten_onto_white(&mut self.rgba, fw as usize);

        if let Some(preprocess) = &options.preprocess {
            preprocess.apply(&mut self.rgba, fw as usize);
        }

        self.luma.resize(fw as usize * fh as usize, 0);
        rgba_to_luma_into(&self.rgba, fw as usize, fh as usize, &mut self.luma);
        self.renders += 1;

        log::trace!("rendered {key}: canonical {cw}x{ch} -> frame {fw}x{fh}");
        Ok(CandidateFrame::new(key, fw, fh, &self.rgba, &self.luma))
    }

    fn scale_into(&mut self, canonical: &CanonicalBitmap, tw: u32, th: u32) -> Result<(), ScanError> {
        let src = canonical.image().as_raw();
        self.scaled.resize(tw as usize * th as usize * 4, 0);
        if (tw, th) == (canonical.width(), canonical.height()) {
            self.scaled.copy_from_slice(src);
            return Ok(());
        }

        let src_view = fr::images::ImageRef::new(
            canonical.width(),
            canonical.height(),
            src,
            fr::PixelType::U8x4,
        )
        .map_err(|e| ScanError::Render(format!("source buffer: {e}")))?;
        let mut dst_view =
            fr::images::Image::from_slice_u8(tw, th, &mut self.scaled, fr::PixelType::U8x4)
                .map_err(|e| ScanError::Render(format!("target buffer: {e}")))?;
        self.resizer
            .resize(&src_view, &mut dst_view, Some(&self.resize_options))
            .map_err(|e| ScanError::Render(format!("resize to {tw}x{th}: {e}")))
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a `w` x `h` RGBA buffer into `dst`, turned clockwise by `rotation`
fn rotate_into(src: &[u8], w: usize, h: usize, rotation: Rotation, dst: &mut [u8]) {
    if rotation == Rotation::Deg0 {
        dst.copy_from_slice(&src[..w * h * 4]);
        return;
    }
    let out_w = if rotation.swaps_dimensions() { h } else { w };
    dst.par_chunks_mut(out_w * 4).enumerate().for_each(|(oy, row)| {
        for ox in 0..out_w {
            let (sx, sy) = match rotation {
                Rotation::Deg90 => (oy, h - 1 - ox),
                Rotation::Deg180 => (w - 1 - ox, h - 1 - oy),
                Rotation::Deg270 => (w - 1 - oy, ox),
                Rotation::Deg0 => (ox, oy),
            };
            let s = (sy * w + sx) * 4;
            row[ox * 4..ox * 4 + 4].copy_from_slice(&src[s..s + 4]);
        }
    });
}

/// Composite every pixel over opaque white; fully transparent becomes white
fn flatten_onto_white(rgba: &mut [u8], width: usize) {
    if width == 0 {
        return;
    }
    rgba.par_chunks_mut(width * 4).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let alpha = px[3] as u32;
            if alpha == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((*c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            }
            px[3] = 255;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage, imageops};

    fn exact() -> RenderOptions {
        RenderOptions {
            min_dimension: 1,
            preprocess: None,
        }
    }

    fn gradient(w: u32, h: u32) -> CanonicalBitmap {
        CanonicalBitmap::from_upright(RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
        }))
    }

    fn solid(w: u32, h: u32, color: [u8; 4]) -> CanonicalBitmap {
        CanonicalBitmap::from_upright(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    #[test]
    fn test_target_size_floor() {
        assert_eq!(target_size(1000, 800, 1.0, 240), (1000, 800));
        assert_eq!(target_size(1000, 800, 0.45, 240), (450, 360));
        assert_eq!(target_size(100, 50, 1.0, 240), (240, 240));
        assert_eq!(target_size(1000, 300, 0.6, 240), (600, 240));
    }

    #[test]
    fn test_rotation_matches_imageops() {
        let canonical = gradient(7, 4);
        let mut surface = RasterSurface::new();
        let expected = [
            (Rotation::Deg0, canonical.image().clone()),
            (Rotation::Deg90, imageops::rotate90(canonical.image())),
            (Rotation::Deg180, imageops::rotate180(canonical.image())),
            (Rotation::Deg270, imageops::rotate270(canonical.image())),
        ];
        for (rotation, want) in expected {
            let frame = surface
                .render(&canonical, CandidateKey::new(1.0, rotation), &exact())
                .unwrap();
            assert_eq!((frame.width, frame.height), want.dimensions(), "{rotation}");
            assert_eq!(frame.rgba, want.as_raw().as_slice(), "{rotation}");
        }
    }

    #[test]
    fn test_scaled_rotation_swaps_dimensions() {
        let canonical = gradient(400, 300);
        let mut surface = RasterSurface::new();
        let frame = surface
            .render(&canonical, CandidateKey::new(0.5, Rotation::Deg90), &exact())
            .unwrap();
        assert_eq!((frame.width, frame.height), (150, 200));
        assert_eq!(frame.luma.len(), 150 * 200);
        assert_eq!(frame.rgba.len(), 150 * 200 * 4);
    }

    #[test]
    fn test_min_dimension_applies_to_frames() {
        let canonical = gradient(100, 50);
        let mut surface = RasterSurface::new();
        let frame = surface
            .render(
                &canonical,
                CandidateKey::new(0.45, Rotation::Deg0),
                &RenderOptions::default(),
            )
            .unwrap();
        assert_eq!((frame.width, frame.height), (240, 240));
    }

    #[test]
    fn test_surface_is_fully_overwritten() {
        let red = solid(500, 400, [255, 0, 0, 255]);
        let blue = solid(320, 260, [0, 0, 255, 255]);
        let mut surface = RasterSurface::new();

        surface
            .render(&red, CandidateKey::new(1.0, Rotation::Deg90), &exact())
            .unwrap();
        let frame = surface
            .render(&blue, CandidateKey::new(0.8, Rotation::Deg0), &exact())
            .unwrap();
        assert_eq!(frame.rgba.len(), 256 * 208 * 4);
        assert!(
            frame
                .rgba
                .chunks_exact(4)
                .all(|px| px[0] == 0 && px[1] == 0 && px[2] >= 250),
            "stale pixels leaked from previous frame"
        );
        assert!(frame.luma.iter().all(|&v| v <= 30));
        assert_eq!(surface.renders(), 2);
    }

    #[test]
    fn test_preprocess_is_applied_after_render() {
        let grey = solid(10, 10, [100, 100, 100, 255]);
        let mut surface = RasterSurface::new();
        let options = RenderOptions {
            min_dimension: 1,
            preprocess: Some(Preprocess::default()),
        };
        let frame = surface
            .render(&grey, CandidateKey::new(1.0, Rotation::Deg180), &options)
            .unwrap();
        let want = Preprocess::default().lut()[100];
        assert!(frame.rgba.chunks_exact(4).all(|px| px == [want, want, want, 255]));
    }

    #[test]
    fn test_transparent_pixels_render_white() {
        let mut img = RgbaImage::from_pixel(12, 8, Rgba([0, 0, 0, 0]));
        img.put_pixel(3, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(5, 2, Rgba([0, 0, 0, 128]));
        let canonical = CanonicalBitmap::from_upright(img);
        let mut surface = RasterSurface::new();
        let frame = surface
            .render(&canonical, CandidateKey::new(1.0, Rotation::Deg0), &exact())
            .unwrap();

        assert!(frame.rgba.chunks_exact(4).all(|px| px[3] == 255));
        assert_eq!(frame.luma[0], 255);
        assert_eq!(frame.luma[2 * 12 + 3], 0);
        let half = frame.luma[2 * 12 + 5];
        assert!((120..=135).contains(&half), "half-transparent ink gave {half}");
    }

    #[test]
    fn test_capacity_is_reused() {
        let canonical = gradient(300, 300);
        let mut surface = RasterSurface::with_capacity(300 * 300);
        assert!(surface.capacity_pixels() >= 300 * 300);
        surface
            .render(&canonical, CandidateKey::new(0.8, Rotation::Deg0), &exact())
            .unwrap();
        surface.clear();
        assert!(surface.capacity_pixels() >= 300 * 300);
    }
}
