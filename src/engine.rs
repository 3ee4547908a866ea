// src/engine.rs
//
// The normalization engine. A single synchronous pass that:
// 1. Sniffs the container from magic bytes
// 2. Decodes (JPEG scaled inside the decoder, everything else at full size)
// 3. Corrects EXIF orientation, resamples to the scale plan, reduces to gray
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Images larger than 32768x32768 are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA. Beyond this is likely malicious.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod api;
mod colorspace;
pub(crate) mod common;
mod decoder;
mod encoder;
mod jpeg;
mod orientation;
mod pipeline;
mod scale;
mod sniff;

pub use api::{decode_config, normalize, transform, transform_with_options, Normalized};
pub use colorspace::to_gray;
pub use decoder::{check_dimensions, ColorModel, ImageConfig};
pub use encoder::encode;
pub use jpeg::{dct_ratios, scaled_dimension, select_dct_ratio, DCT_DENOMINATOR};
pub use orientation::{correct_orientation, resolve_orientation, Orientation};
pub use pipeline::resample;
pub use scale::{
    a4_scale, is_near_identity, A4Scale, ScalePlan, ScalePolicy, A4_LONG, A4_SHORT,
    NEAR_IDENTITY_HIGH, NEAR_IDENTITY_LOW,
};
pub use sniff::{sniff, FormatTag};

// Per-codec entry points, exposed so fuzz targets can reach past the dispatcher.
#[cfg(feature = "fuzzing")]
pub use decoder::{decode_generic, decode_png_zune, decode_webp_libwebp, image_config};
#[cfg(feature = "fuzzing")]
pub use encoder::{encode_jpeg, encode_png, encode_webp};
#[cfg(feature = "fuzzing")]
pub use jpeg::jpeg_config;
