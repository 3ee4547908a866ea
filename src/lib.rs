// lib.rs
//
// ocr-normalize: turn arbitrary images into an OCR-ready raster
//
// Design goals:
// - Upright reading order regardless of camera EXIF orientation
// - Bounded resolution: an A4 page at 150 ppi, whatever the source
// - Fastest correct decode per format (JPEG scales inside the decoder)
// - Optional single-channel output so OCR engines skip the color work

//! Normalize JPEG, PNG, WebP, TIFF, GIF, BMP and HEIF input into a raster
//! that is oriented, capped at A4 @ 150 ppi, and optionally grayscale.
//!
//! ```no_run
//! let bytes = std::fs::read("scan.jpg")?;
//! let out = ocr_normalize::normalize(&bytes, true)?;
//! println!(
//!     "{}x{} (from {}x{}, factor {:.3})",
//!     out.raster.width(),
//!     out.raster.height(),
//!     out.original_width,
//!     out.original_height,
//!     out.scale_factor,
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod codecs;
pub mod engine;
pub mod error;
pub mod ops;
pub mod raster;

pub use engine::{
    correct_orientation, decode_config, encode, normalize, resolve_orientation, sniff, to_gray,
    transform, transform_with_options, A4Scale, ColorModel, FormatTag, ImageConfig, Normalized,
    Orientation, ScalePlan, ScalePolicy,
};
pub use error::{ErrorCategory, NormalizeError, Result};
pub use ops::{OutputFormat, ResizeKernel, TransformOptions};
pub use raster::{PixelLayout, Raster};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Container formats `transform` accepts. HEIF is listed only when built
/// with the `heif` feature.
pub fn supported_input_formats() -> Vec<FormatTag> {
    let mut formats = vec![
        FormatTag::Jpeg,
        FormatTag::Png,
        FormatTag::WebP,
        FormatTag::Tiff,
        FormatTag::Gif,
        FormatTag::Bmp,
    ];
    if cfg!(feature = "heif") {
        formats.push(FormatTag::Heif);
    }
    formats
}

pub fn supported_output_formats() -> [OutputFormat; 3] {
    [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::WebP]
}
