//! Synthetic label photos for integration tests

#![allow(dead_code)]

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};

const PAPER: Rgba<u8> = Rgba([236, 233, 226, 255]);
const INK: Rgba<u8> = Rgba([24, 22, 30, 255]);

/// A `width` x `height` photo with a QR code for `text` centred on it
pub fn qr_photo(text: &str, width: u32, height: u32) -> RgbaImage {
    let matrix = MultiFormatWriter::default()
        .encode(text, &BarcodeFormat::QR_CODE, 0, 0)
        .expect("QR encode");
    let modules = matrix.width();
    // Code spans roughly 40% of the short side
    let module = (width.min(height) * 2 / 5 / modules).max(2);
    let side = modules * module;
    let (ox, oy) = ((width - side) / 2, (height - side) / 2);

    let mut img = RgbaImage::from_pixel(width, height, PAPER);
    for my in 0..matrix.height() {
        for mx in 0..modules {
            if !matrix.get(mx, my) {
                continue;
            }
            for dy in 0..module {
                for dx in 0..module {
                    img.put_pixel(ox + mx * module + dx, oy + my * module + dy, INK);
                }
            }
        }
    }
    img
}

/// A `width` x `height` photo with a horizontal Code 128 barcode
pub fn code128_photo(text: &str, width: u32, height: u32) -> RgbaImage {
    let matrix = MultiFormatWriter::default()
        .encode(text, &BarcodeFormat::CODE_128, 0, 0)
        .expect("Code 128 encode");
    let modules = matrix.width();
    let module = (width * 3 / 5 / modules).max(2);
    let bar_height = height / 4;
    let (ox, oy) = ((width - modules * module) / 2, (height - bar_height) / 2);

    let mut img = RgbaImage::from_pixel(width, height, PAPER);
    for mx in 0..modules {
        if !matrix.get(mx, 0) {
            continue;
        }
        for dx in 0..module {
            for y in 0..bar_height {
                img.put_pixel(ox + mx * module + dx, oy + y, INK);
            }
        }
    }
    img
}

/// QR code in opaque black on a fully transparent background
pub fn transparent_qr(text: &str, width: u32, height: u32) -> RgbaImage {
    let mut img = qr_photo(text, width, height);
    for px in img.pixels_mut() {
        *px = if *px == INK {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        };
    }
    img
}

/// Plain white image
pub fn blank(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
}

/// Baseline JPEG without any APP1 segment
pub fn jpeg(img: &RgbaImage) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 95)
        .encode_image(&rgb)
        .expect("JPEG encode");
    bytes
}

pub fn png(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encode");
    bytes
}

/// Insert a big-endian EXIF APP1 segment carrying `orientation` right after SOI
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Exif\0\0");
    payload.extend_from_slice(b"MM\0\x2A");
    payload.extend_from_slice(&8u32.to_be_bytes());
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.extend_from_slice(&0x0112u16.to_be_bytes());
    payload.extend_from_slice(&3u16.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0u32.to_be_bytes());

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}
