// src/engine/pipeline.rs
//
// Resampling stage of the generic decode path.
// fast_image_resize does the work; image::imageops is the fallback when
// fir rejects the buffer.

use crate::engine::common::EngineResult;
use crate::error::NormalizeError;
use crate::ops::ResizeKernel;
use crate::raster::{PixelLayout, Raster};
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::imageops::FilterType;
use image::{GrayImage, RgbImage, RgbaImage};
use tracing::debug;

#[derive(Debug)]
pub struct ResizeError {
    pub source_dims: (u32, u32),
    pub target_dims: (u32, u32),
    pub reason: String,
}

impl ResizeError {
    pub fn new(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source_dims,
            target_dims,
            reason: reason.into(),
        }
    }

    pub fn into_normalize_error(self) -> NormalizeError {
        NormalizeError::resize_failed(self.source_dims, self.target_dims, self.reason)
    }
}

impl ResizeKernel {
    fn resize_options(self) -> ResizeOptions {
        let alg = match self {
            ResizeKernel::Nearest => fir::ResizeAlg::Nearest,
            ResizeKernel::Bilinear => fir::ResizeAlg::Convolution(fir::FilterType::Bilinear),
            ResizeKernel::CatmullRom => fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom),
            ResizeKernel::Mitchell => fir::ResizeAlg::Convolution(fir::FilterType::Mitchell),
            ResizeKernel::Lanczos3 => fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3),
        };
        ResizeOptions::new().resize_alg(alg)
    }

    // image::imageops has no Mitchell; CatmullRom is the nearest cubic.
    fn fallback_filter(self) -> FilterType {
        match self {
            ResizeKernel::Nearest => FilterType::Nearest,
            ResizeKernel::Bilinear => FilterType::Triangle,
            ResizeKernel::CatmullRom | ResizeKernel::Mitchell => FilterType::CatmullRom,
            ResizeKernel::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn pixel_type_for(layout: PixelLayout) -> PixelType {
    match layout {
        PixelLayout::Gray => PixelType::U8,
        PixelLayout::Rgb => PixelType::U8x3,
        PixelLayout::Rgba => PixelType::U8x4,
    }
}

/// Resample `raster` to exactly `dst_width x dst_height` with `kernel`.
///
/// Output keeps the input layout and is packed. Padding on the input is
/// stripped before resampling.
pub fn resample(
    raster: Raster,
    dst_width: u32,
    dst_height: u32,
    kernel: ResizeKernel,
) -> EngineResult<Raster> {
    let (src_width, src_height) = raster.dimensions();
    let layout = raster.layout();
    if (src_width, src_height) == (dst_width, dst_height) {
        if raster.is_packed() {
            return Ok(raster);
        }
        let stride = src_width as usize * layout.bytes_per_pixel();
        return Raster::from_raw(src_width, src_height, stride, layout, raster.into_packed_bytes());
    }
    debug!(
        src_width,
        src_height,
        dst_width,
        dst_height,
        layout = layout.as_str(),
        ?kernel,
        "resampling"
    );
    let pixels = raster.into_packed_bytes();
    let resized = resample_pixels(
        src_width, src_height, pixels, layout, dst_width, dst_height, kernel,
    )
    .map_err(|reason| {
        ResizeError::new((src_width, src_height), (dst_width, dst_height), reason)
            .into_normalize_error()
    })?;
    Raster::from_raw(
        dst_width,
        dst_height,
        dst_width as usize * layout.bytes_per_pixel(),
        layout,
        resized,
    )
}

fn resample_pixels(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    layout: PixelLayout,
    dst_width: u32,
    dst_height: u32,
    kernel: ResizeKernel,
) -> std::result::Result<Vec<u8>, String> {
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err("invalid dimensions for resize".to_string());
    }
    let pixel_type = pixel_type_for(layout);
    let required_bytes = (src_width as usize)
        .checked_mul(src_height as usize)
        .and_then(|count| count.checked_mul(pixel_type.size()))
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "fir source image invalid buffer size. expected {required_bytes} bytes, got {} bytes",
            src_pixels.len()
        ));
    }
    let options = kernel.resize_options();

    let primary_result = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        &mut src_pixels[..required_bytes],
        pixel_type,
    ) {
        Ok(src_image) => {
            resize_with_source_image(src_image, pixel_type, dst_width, dst_height, &options)
        }
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let aligned_image = copy_pixels_to_aligned_image(
                src_width,
                src_height,
                pixel_type,
                &src_pixels,
                required_bytes,
            )?;
            resize_with_source_image(aligned_image, pixel_type, dst_width, dst_height, &options)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary_result {
        Ok(pixels) => Ok(pixels),
        Err(err) => {
            debug!(error = %err, "fir resize failed, using image crate fallback");
            resize_with_image_crate_fallback(
                &src_pixels[..required_bytes],
                src_width,
                src_height,
                layout,
                dst_width,
                dst_height,
                kernel.fallback_filter(),
            )
            .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}"))
        }
    }
}

fn copy_pixels_to_aligned_image(
    width: u32,
    height: u32,
    pixel_type: PixelType,
    src_pixels: &[u8],
    required_bytes: usize,
) -> std::result::Result<fir::images::Image<'static>, String> {
    let mut aligned_image = fir::images::Image::new(width, height, pixel_type);
    let aligned_buffer = aligned_image.buffer_mut();
    if aligned_buffer.len() != required_bytes {
        return Err(format!(
            "fir alignment fallback buffer mismatch. expected {required_bytes} bytes, got {} bytes",
            aligned_buffer.len()
        ));
    }
    aligned_buffer.copy_from_slice(&src_pixels[..required_bytes]);
    Ok(aligned_image)
}

fn resize_with_image_crate_fallback(
    src_pixels: &[u8],
    src_width: u32,
    src_height: u32,
    layout: PixelLayout,
    dst_width: u32,
    dst_height: u32,
    filter: FilterType,
) -> std::result::Result<Vec<u8>, String> {
    let pixels = src_pixels.to_vec();
    match layout {
        PixelLayout::Gray => {
            let gray = GrayImage::from_raw(src_width, src_height, pixels)
                .ok_or_else(|| "failed to build gray image for fallback resize".to_string())?;
            Ok(image::imageops::resize(&gray, dst_width, dst_height, filter).into_raw())
        }
        PixelLayout::Rgb => {
            let rgb = RgbImage::from_raw(src_width, src_height, pixels)
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(image::imageops::resize(&rgb, dst_width, dst_height, filter).into_raw())
        }
        PixelLayout::Rgba => {
            let rgba = RgbaImage::from_raw(src_width, src_height, pixels)
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(image::imageops::resize(&rgba, dst_width, dst_height, filter).into_raw())
        }
    }
}

/// Alpha must be premultiplied before convolution so transparent pixels
/// do not bleed their color into neighbours.
fn needs_premultiply(image: &fir::images::Image, pixel_type: PixelType) -> bool {
    if pixel_type != PixelType::U8x4 {
        return false;
    }
    // Scans are only worth it on large images; premultiply is SIMD-fast otherwise.
    const THRESHOLD_PIXELS: u64 = 1_000_000;
    let pixels = image.width() as u64 * image.height() as u64;
    if pixels < THRESHOLD_PIXELS {
        return true;
    }
    !image.buffer().iter().skip(3).step_by(4).all(|&alpha| alpha == 255)
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<Vec<u8>, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);
    let premultiply = needs_premultiply(&src_image, pixel_type);

    let mul_div = MulDiv::default();
    if premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    Ok(dst_image.into_vec())
}
