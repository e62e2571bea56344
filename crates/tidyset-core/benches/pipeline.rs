//! Benchmarks for the Tidyset image pipeline.
//!
//! Run with: cargo bench -p tidyset-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use tidyset_core::config::{LimitsConfig, PaddingColor, ProcessingConfig, SidecarConfig};
use tidyset_core::pipeline::transform::letterbox;
use tidyset_core::pipeline::{
    DuplicateDetector, FileDiscovery, Hasher, ImageDecoder, ProgressTracker, SidecarWriter,
};

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    }))
}

fn benchmark_fingerprint(c: &mut Criterion) {
    let img = gradient(1024, 768);

    c.bench_function("fingerprint_blake3_1024x768", |b| {
        b.iter(|| {
            let _ = Hasher::fingerprint(black_box(&img));
        })
    });
}

fn benchmark_letterbox(c: &mut Criterion) {
    let img = gradient(1920, 1080);

    c.bench_function("letterbox_512_black", |b| {
        b.iter(|| {
            let _ = letterbox(black_box(&img), 512, PaddingColor::Black);
        })
    });

    c.bench_function("letterbox_1024_transparent", |b| {
        b.iter(|| {
            let _ = letterbox(black_box(&img), 1024, PaddingColor::Transparent);
        })
    });
}

fn benchmark_find_duplicates(c: &mut Criterion) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Skipping find_duplicates benchmark: {e}");
            return;
        }
    };
    for i in 0..32u32 {
        let img = gradient(128, 128 + i % 4);
        if img.save(dir.path().join(format!("{i}.png"))).is_err() {
            eprintln!("Skipping find_duplicates benchmark: could not write fixtures");
            return;
        }
    }

    let detector = DuplicateDetector::new(
        FileDiscovery::new(ProcessingConfig::default()),
        Hasher::new(ImageDecoder::new(LimitsConfig::default())),
        SidecarWriter::new(&SidecarConfig::default()),
    );

    c.bench_function("find_duplicates_32_files", |b| {
        b.iter(|| {
            let progress = ProgressTracker::default();
            let _ = detector.find_duplicates(black_box(dir.path()), &progress);
        })
    });
}

criterion_group!(
    benches,
    benchmark_fingerprint,
    benchmark_letterbox,
    benchmark_find_duplicates,
);
criterion_main!(benches);
