use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, ImageFormat, RgbImage};
use ocr_normalize::{encode, normalize, OutputFormat, PixelLayout, Raster};
use std::hint::black_box;
use std::io::Cursor;

/// A 300 ppi A4 page: the JPEG path halves it inside the decoder, the
/// PNG path decodes at full size and resamples.
const PAGE: (u32, u32) = (2480, 3508);

fn page_raster() -> Raster {
    let (w, h) = PAGE;
    let img = RgbImage::from_fn(w, h, |x, y| {
        let ink = if (x / 40 + y / 60) % 7 == 0 { 20 } else { 235 };
        image::Rgb([ink, ink, ink.saturating_add((x % 16) as u8)])
    });
    Raster::from_dynamic(DynamicImage::ImageRgb8(img))
}

fn page_png(raster: &Raster) -> Vec<u8> {
    let img = raster.clone().into_dynamic().unwrap();
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn bench_normalize(c: &mut Criterion) {
    let raster = page_raster();
    let inputs = [
        ("jpeg", encode(&raster, OutputFormat::Jpeg, Some(85)).unwrap()),
        ("png", page_png(&raster)),
        ("webp", encode(&raster, OutputFormat::WebP, Some(80)).unwrap()),
    ];

    let mut group = c.benchmark_group("normalize_a4_page");
    group.sample_size(10);
    group.throughput(Throughput::Elements((PAGE.0 * PAGE.1) as u64));
    for (name, bytes) in &inputs {
        for grayscale in [false, true] {
            let id = BenchmarkId::new(*name, if grayscale { "gray" } else { "color" });
            group.bench_with_input(id, bytes, |b, bytes| {
                b.iter(|| normalize(black_box(bytes), grayscale).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let (w, h) = (1240, 1754);
    let gray = Raster::from_raw(
        w,
        h,
        w as usize,
        PixelLayout::Gray,
        (0..w * h).map(|i| (i % 251) as u8).collect(),
    )
    .unwrap();

    let mut group = c.benchmark_group("encode_normalized_gray");
    group.sample_size(10);
    for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP] {
        group.bench_function(format.as_str(), |b| {
            b.iter(|| encode(black_box(&gray), format, Some(80)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normalize, bench_encode);
criterion_main!(benches);
