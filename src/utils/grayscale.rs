//! Convert RGBA frames to a luminance plane
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
//!
//! The alpha channel is ignored; the render stage flattens frames onto white
//! before conversion.

use rayon::prelude::*;

/// Coefficients for luminance conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Frames below this pixel count are converted on the calling thread
const PARALLEL_MIN_PIXELS: usize = 64 * 1024;

#[inline]
fn luma(px: &[u8]) -> u8 {
    let lum = (COEF_R * px[0] as u32 + COEF_G * px[1] as u32 + COEF_B * px[2] as u32) >> 8;
    lum.min(255) as u8
}

/// Convert an RGBA image to luminance
pub fn rgba_to_luma(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    rgba_to_luma_into(rgba, width, height, &mut out);
    out
}

/// Convert RGBA to luminance into a pre-allocated buffer (no allocation)
///
/// Large frames are converted row-parallel.
///
/// # Returns
/// Number of pixels written (width * height)
pub fn rgba_to_luma_into(rgba: &[u8], width: usize, height: usize, output: &mut [u8]) -> usize {
    let pixel_count = width * height;
    assert!(rgba.len() >= pixel_count * 4, "Input buffer too small");
    assert!(output.len() >= pixel_count, "Output buffer too small");
    if pixel_count == 0 {
        return 0;
    }

    let output = &mut output[..pixel_count];
    let rgba = &rgba[..pixel_count * 4];
    if pixel_count >= PARALLEL_MIN_PIXELS {
        output
            .par_chunks_mut(width)
            .zip(rgba.par_chunks(width * 4))
            .for_each(|(row, src)| {
                for (dst, px) in row.iter_mut().zip(src.chunks_exact(4)) {
                    *dst = luma(px);
                }
            });
    } else {
        for (dst, px) in output.iter_mut().zip(rgba.chunks_exact(4)) {
            *dst = luma(px);
        }
    }

    pixel_count
}
