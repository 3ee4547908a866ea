// src/engine/jpeg.rs
//
// JPEG fast path: mozjpeg (libjpeg-turbo) scales during decode by skipping
// DCT coefficients, so large scans never exist at full resolution. Output
// is decoded straight to gray or RGB.

use crate::engine::api::Normalized;
use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::decoder::{validate_header_dimensions, ColorModel, ImageConfig};
use crate::engine::orientation::{correct_orientation, resolve_orientation};
use crate::engine::scale::{is_near_identity, ScalePolicy};
use crate::engine::sniff::FormatTag;
use crate::error::NormalizeError;
use crate::raster::{PixelLayout, Raster};
use mozjpeg::{ColorSpace, Decompress};
use tracing::{debug, warn};

/// libjpeg-turbo reconstructs at `n/8` of the stored size.
pub const DCT_DENOMINATOR: u32 = 8;

/// Downscaling ratios the decoder supports, largest first. Ties in
/// [`select_dct_ratio`] go to the earlier entry.
pub fn dct_ratios() -> impl Iterator<Item = (u32, u32)> {
    (1..=DCT_DENOMINATOR).rev().map(|num| (num, DCT_DENOMINATOR))
}

/// The supported ratio closest to `preferred`.
pub fn select_dct_ratio(preferred: f64) -> (u32, u32) {
    let mut selected = (DCT_DENOMINATOR, DCT_DENOMINATOR);
    let mut selected_diff = f64::MAX;
    for (num, denom) in dct_ratios() {
        let diff = (preferred - num as f64 / denom as f64).abs();
        if diff < selected_diff {
            selected_diff = diff;
            selected = (num, denom);
        }
    }
    selected
}

/// Output size for one axis: `ceil(dim * num / denom)`, the rounding libjpeg
/// applies to scaled output.
pub fn scaled_dimension(dim: u32, num: u32, denom: u32) -> u32 {
    ((dim as u64 * num as u64 + denom as u64 - 1) / denom as u64) as u32
}

fn color_model_of(space: ColorSpace) -> ColorModel {
    match space {
        ColorSpace::JCS_GRAYSCALE => ColorModel::Gray,
        ColorSpace::JCS_RGB => ColorModel::Rgb,
        ColorSpace::JCS_YCbCr => ColorModel::YCbCr,
        ColorSpace::JCS_CMYK | ColorSpace::JCS_YCCK => ColorModel::Cmyk,
        _ => ColorModel::Other,
    }
}

fn open(bytes: &[u8]) -> EngineResult<Decompress<&[u8]>> {
    Decompress::new_mem(bytes)
        .map_err(|e| NormalizeError::malformed_stream(format!("jpeg: header: {e}")))
}

/// Header-only inspection; reports the stored (uncorrected) dimensions.
pub fn jpeg_config(bytes: &[u8]) -> EngineResult<ImageConfig> {
    run_with_panic_policy("config:mozjpeg", || {
        let decompress = open(bytes)?;
        Ok(ImageConfig {
            width: decompress.width() as u32,
            height: decompress.height() as u32,
            color_model: color_model_of(decompress.color_space()),
            format: FormatTag::Jpeg,
        })
    })
}

/// What the fast path produced.
pub(crate) enum JpegDecode {
    Scaled(Normalized),
    /// CMYK/YCCK streams cannot be converted to gray or RGB by libjpeg; the
    /// caller decodes them through the generic path instead.
    NeedsGenericPath,
}

/// Decode `bytes` at the DCT ratio closest to what `policy` asks for, then
/// correct orientation on the reduced raster.
///
/// `original_width`/`original_height` are the header dimensions after
/// orientation correction.
pub(crate) fn transform_jpeg<P>(bytes: &[u8], grayscale: bool, policy: &P) -> EngineResult<JpegDecode>
where
    P: ScalePolicy + ?Sized,
{
    let orientation = resolve_orientation(bytes);

    let decoded = run_with_panic_policy("decode:mozjpeg", || {
        let mut decompress = open(bytes)?;
        let (width, height) = (decompress.width() as u32, decompress.height() as u32);
        validate_header_dimensions("jpeg", width, height)?;

        let color_space = decompress.color_space();
        if matches!(color_space, ColorSpace::JCS_CMYK | ColorSpace::JCS_YCCK) {
            debug!(?color_space, "jpeg color space not supported by fast path");
            return Ok(None);
        }

        // Plan in display orientation; a DCT ratio is uniform so only the factor matters.
        let (display_width, display_height) = orientation.corrected_dimensions(width, height);
        let plan = policy.plan(display_width, display_height);

        let (mut num, denom) = select_dct_ratio(plan.scale_factor);
        let mut scale_factor = num as f64 / denom as f64;
        if is_near_identity(scale_factor) {
            num = denom;
            scale_factor = 1.0;
        } else {
            decompress.scale(num as u8);
        }
        debug!(
            width,
            height,
            preferred = plan.scale_factor,
            num,
            denom,
            target_width = scaled_dimension(width, num, denom),
            target_height = scaled_dimension(height, num, denom),
            grayscale,
            "jpeg dct scale selected"
        );

        let raster = read_pixels(decompress, grayscale)?;
        Ok(Some((raster, width, height, scale_factor)))
    })?;

    let Some((raster, width, height, scale_factor)) = decoded else {
        return Ok(JpegDecode::NeedsGenericPath);
    };
    let raster = correct_orientation(raster, orientation)?;
    let (original_width, original_height) = orientation.corrected_dimensions(width, height);
    Ok(JpegDecode::Scaled(Normalized {
        raster,
        original_width,
        original_height,
        scale_factor,
    }))
}

fn read_pixels(decompress: Decompress<&[u8]>, grayscale: bool) -> EngineResult<Raster> {
    let started = if grayscale {
        decompress.grayscale()
    } else {
        decompress.rgb()
    };
    let mut started = started.map_err(|e| {
        NormalizeError::resource_init_failure("mozjpeg", format!("start decompress: {e}"))
    })?;
    let (width, height) = (started.width() as u32, started.height() as u32);

    let (layout, pixels) = if grayscale {
        let pixels: Vec<u8> = started.read_scanlines().map_err(|e| {
            NormalizeError::malformed_stream(format!("jpeg: failed to read scanlines: {e}"))
        })?;
        (PixelLayout::Gray, pixels)
    } else {
        let pixels: Vec<[u8; 3]> = started.read_scanlines().map_err(|e| {
            NormalizeError::malformed_stream(format!("jpeg: failed to read scanlines: {e}"))
        })?;
        (PixelLayout::Rgb, pixels.into_iter().flatten().collect())
    };

    // All rows are in hand at this point; a complaint while finishing is not fatal.
    if let Err(e) = started.finish() {
        let warning = NormalizeError::decoder_warning(format!("jpeg: {e}"));
        warn!(%warning, "keeping decoded pixels");
    }

    Raster::from_raw(
        width,
        height,
        width as usize * layout.bytes_per_pixel(),
        layout,
        pixels,
    )
    .map_err(|e| NormalizeError::malformed_stream(format!("jpeg: short scanline data: {e}")))
}
