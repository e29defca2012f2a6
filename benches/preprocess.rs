use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use invscan::models::{CandidateKey, Rotation};
use invscan::render::{Preprocess, RasterSurface, RenderOptions};
use invscan::utils::grayscale::rgba_to_luma;
use invscan::CanonicalBitmap;

fn gradient(w: u32, h: u32) -> CanonicalBitmap {
    CanonicalBitmap::from_upright(RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8, 255])
    }))
}

fn bench_lut_apply(c: &mut Criterion) {
    let preprocess = Preprocess::default();
    let mut rgba = vec![128u8; 1000 * 800 * 4];
    c.bench_function("preprocess_1000x800", |b| {
        b.iter(|| preprocess.apply(black_box(&mut rgba), black_box(1000)))
    });
}

fn bench_luma_medium(c: &mut Criterion) {
    let rgba = vec![128u8; 640 * 480 * 4];
    c.bench_function("rgba_to_luma_640x480", |b| {
        b.iter(|| rgba_to_luma(black_box(&rgba), black_box(640), black_box(480)))
    });
}

fn bench_luma_large(c: &mut Criterion) {
    let rgba = vec![128u8; 1920 * 1080 * 4];
    c.bench_function("rgba_to_luma_1920x1080", |b| {
        b.iter(|| rgba_to_luma(black_box(&rgba), black_box(1920), black_box(1080)))
    });
}

fn bench_render_reused_surface(c: &mut Criterion) {
    let canonical = gradient(1000, 800);
    let options = RenderOptions::default();
    let mut surface = RasterSurface::with_capacity(1000 * 800);
    let key = CandidateKey::new(0.8, Rotation::Deg90);
    c.bench_function("render_x0.8_90deg_reused", |b| {
        b.iter(|| {
            let frame = surface.render(black_box(&canonical), key, &options).unwrap();
            black_box(frame.luma.len())
        })
    });
}

fn bench_render_fresh_surface(c: &mut Criterion) {
    let canonical = gradient(1000, 800);
    let options = RenderOptions::default();
    let key = CandidateKey::new(0.8, Rotation::Deg90);
    c.bench_function("render_x0.8_90deg_fresh", |b| {
        b.iter(|| {
            let mut surface = RasterSurface::new();
            let frame = surface.render(black_box(&canonical), key, &options).unwrap();
            black_box(frame.luma.len())
        })
    });
}

criterion_group!(
    benches,
    bench_lut_apply,
    bench_luma_medium,
    bench_luma_large,
    bench_render_reused_surface,
    bench_render_fresh_surface
);
criterion_main!(benches);
