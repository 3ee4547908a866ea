// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg), PNG (image crate + oxipng), WebP (libwebp)

use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::error::NormalizeError;
use crate::ops::OutputFormat;
use crate::raster::{PixelLayout, Raster};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use mozjpeg::{ColorSpace, Compress};
use tracing::debug;

/// Encode a raster. `quality` is 0-100; `None` picks each format's default:
/// JPEG at 80, PNG without the oxipng pass, WebP lossless.
pub fn encode(raster: &Raster, format: OutputFormat, quality: Option<u8>) -> EngineResult<Vec<u8>> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(NormalizeError::invalid_raster(format!(
            "cannot encode zero-area raster {width}x{height}"
        )));
    }
    let quality = quality.map(|q| q.min(100));
    debug!(
        format = format.as_str(),
        width,
        height,
        layout = raster.layout().as_str(),
        ?quality,
        "encode"
    );
    match format {
        OutputFormat::Jpeg => encode_jpeg(
            raster,
            quality.unwrap_or(OutputFormat::DEFAULT_JPEG_QUALITY),
        ),
        OutputFormat::Png => encode_png(raster, quality),
        OutputFormat::WebP => encode_webp(raster, quality),
    }
}

/// (input color space, stored color space) for each layout. RGBA goes in as
/// RGBX, so alpha is ignored.
fn jpeg_color_spaces(layout: PixelLayout) -> (ColorSpace, ColorSpace) {
    match layout {
        PixelLayout::Gray => (ColorSpace::JCS_GRAYSCALE, ColorSpace::JCS_GRAYSCALE),
        PixelLayout::Rgb => (ColorSpace::JCS_RGB, ColorSpace::JCS_YCbCr),
        PixelLayout::Rgba => (ColorSpace::JCS_EXT_RGBX, ColorSpace::JCS_YCbCr),
    }
}

/// Baseline JPEG. Color is stored as YCbCr 4:2:0, gray as a single component.
pub fn encode_jpeg(raster: &Raster, quality: u8) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        let (w, h) = raster.dimensions();
        let (input_space, stored_space) = jpeg_color_spaces(raster.layout());

        let mut comp = Compress::new(input_space);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(stored_space);
        comp.set_quality(quality.min(100) as f32);
        if matches!(stored_space, ColorSpace::JCS_YCbCr) {
            comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        }

        let estimated_size = (w as usize * h as usize * raster.layout().bytes_per_pixel() / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);
        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                NormalizeError::resource_init_failure("mozjpeg", format!("start compress: {e}"))
            })?;
            for row in raster.rows() {
                writer.write_scanlines(row).map_err(|e| {
                    NormalizeError::encode_failed("jpeg", format!("failed to write scanlines: {e}"))
                })?;
            }
            writer.finish().map_err(|e| {
                NormalizeError::encode_failed("jpeg", format!("failed to finish: {e}"))
            })?;
        }
        Ok(output)
    })
}

fn png_color_type(layout: PixelLayout) -> ExtendedColorType {
    match layout {
        PixelLayout::Gray => ExtendedColorType::L8,
        PixelLayout::Rgb => ExtendedColorType::Rgb8,
        PixelLayout::Rgba => ExtendedColorType::Rgba8,
    }
}

/// oxipng preset for a 0-100 quality: higher quality spends more effort.
fn oxipng_preset(quality: u8) -> u8 {
    (quality / 17).min(6)
}

/// PNG with fast deflate. With a quality the output is recompressed
/// losslessly by oxipng.
pub fn encode_png(raster: &Raster, quality: Option<u8>) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        let (w, h) = raster.dimensions();
        let pixels = raster.packed_bytes();
        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::Adaptive)
            .write_image(&pixels, w, h, png_color_type(raster.layout()))
            .map_err(|e| NormalizeError::encode_failed("png", format!("PNG encode failed: {e}")))?;

        let Some(quality) = quality else {
            return Ok(buf);
        };
        let mut options = oxipng::Options::from_preset(oxipng_preset(quality));
        options.strip = oxipng::StripChunks::Safe;
        oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
            NormalizeError::encode_failed("png", format!("oxipng optimization failed: {e}"))
        })
    })
}

/// WebP via libwebp: lossless without a quality, lossy with one.
/// libwebp has no gray input, so gray rasters are expanded to RGB.
pub fn encode_webp(raster: &Raster, quality: Option<u8>) -> EngineResult<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        let (w, h) = raster.dimensions();
        let pixels = match raster.layout() {
            PixelLayout::Gray => raster
                .packed_bytes()
                .into_iter()
                .flat_map(|v| [v, v, v])
                .collect(),
            PixelLayout::Rgb | PixelLayout::Rgba => raster.packed_bytes(),
        };
        let encoder = match raster.layout() {
            PixelLayout::Rgba => webp::Encoder::from_rgba(&pixels, w, h),
            PixelLayout::Gray | PixelLayout::Rgb => webp::Encoder::from_rgb(&pixels, w, h),
        };
        let mem = match quality {
            None => encoder.encode_lossless(),
            Some(q) => encoder.encode(q as f32),
        };
        if mem.is_empty() {
            return Err(NormalizeError::encode_failed("webp", "libwebp produced no output"));
        }
        Ok(mem.to_vec())
    })
}
