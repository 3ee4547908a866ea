// src/engine/api.rs
//
// Public entry points. Each call is a self-contained synchronous unit of work:
// sniff the container, pick the JPEG fast path or the generic path, and hand
// back the normalized raster with the numbers the caller needs to map
// coordinates back onto the source.

use crate::engine::colorspace::to_gray;
use crate::engine::decoder::{decode_generic, image_config, ImageConfig};
use crate::engine::jpeg::{jpeg_config, transform_jpeg, JpegDecode};
use crate::engine::orientation::{correct_orientation, resolve_orientation, Orientation};
use crate::engine::pipeline::resample;
use crate::engine::scale::{A4Scale, ScalePolicy};
use crate::engine::sniff::{sniff, FormatTag};
use crate::error::{NormalizeError, Result};
use crate::ops::TransformOptions;
use crate::raster::Raster;
use tracing::debug;

/// Output of [`transform`].
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub raster: Raster,
    /// Source width after orientation correction, before scaling
    pub original_width: u32,
    /// Source height after orientation correction, before scaling
    pub original_height: u32,
    /// Factor actually applied; exactly 1.0 when no scaling happened
    pub scale_factor: f64,
}

/// Normalize `bytes` with the default A4 policy.
pub fn normalize(bytes: &[u8], grayscale: bool) -> Result<Normalized> {
    transform(bytes, grayscale, &A4Scale)
}

/// Decode, orient, scale per `policy`, and optionally reduce to gray.
///
/// Fails with `EmptyInput` on a zero-length buffer and `UnsupportedFormat`
/// when no signature matches. Missing or corrupt orientation metadata never
/// fails the call.
pub fn transform<P>(bytes: &[u8], grayscale: bool, policy: &P) -> Result<Normalized>
where
    P: ScalePolicy + ?Sized,
{
    transform_with_options(bytes, TransformOptions::new().grayscale(grayscale), policy)
}

/// [`transform`] with an explicit resampling kernel. The kernel only matters
/// on the generic path; JPEG scaling happens inside the decoder.
pub fn transform_with_options<P>(
    bytes: &[u8],
    options: TransformOptions,
    policy: &P,
) -> Result<Normalized>
where
    P: ScalePolicy + ?Sized,
{
    if bytes.is_empty() {
        return Err(NormalizeError::empty_input());
    }
    let format = sniff(bytes)?;
    debug!(%format, grayscale = options.grayscale, "transform");

    if format == FormatTag::Jpeg {
        match transform_jpeg(bytes, options.grayscale, policy)? {
            JpegDecode::Scaled(normalized) => return Ok(normalized),
            JpegDecode::NeedsGenericPath => {}
        }
    }
    transform_generic(bytes, format, options, policy)
}

fn transform_generic<P>(
    bytes: &[u8],
    format: FormatTag,
    options: TransformOptions,
    policy: &P,
) -> Result<Normalized>
where
    P: ScalePolicy + ?Sized,
{
    // HEIF rotation is applied by libheif; the remaining formats carry no EXIF.
    let orientation = match format {
        FormatTag::Tiff | FormatTag::Jpeg => resolve_orientation(bytes),
        _ => Orientation::TopLeft,
    };

    let raster = decode_generic(bytes, format)?;
    let raster = correct_orientation(raster, orientation)?;
    let (original_width, original_height) = raster.dimensions();

    let plan = policy.plan(original_width, original_height);
    let (raster, scale_factor) = if plan.needs_resample() {
        let resized = resample(raster, plan.width, plan.height, options.kernel)?;
        (resized, plan.scale_factor)
    } else {
        debug!(factor = plan.scale_factor, "scale within near-identity band, skipping resample");
        (raster, 1.0)
    };

    let raster = if options.grayscale {
        to_gray(raster)
    } else {
        raster
    };

    Ok(Normalized {
        raster,
        original_width,
        original_height,
        scale_factor,
    })
}

/// Width, height, color model and container format, read from headers only.
pub fn decode_config(bytes: &[u8]) -> Result<ImageConfig> {
    if bytes.is_empty() {
        return Err(NormalizeError::empty_input());
    }
    match sniff(bytes)? {
        FormatTag::Jpeg => jpeg_config(bytes),
        other => image_config(bytes, other),
    }
}
