// src/codecs/heif.rs
//
// HEIF/HEIC decoding through libheif.
// Only compiled in with the `heif` feature; without it the same entry points
// report the format as unsupported so the dispatcher stays feature-agnostic.

use crate::error::NormalizeError;
use crate::raster::Raster;

type HeifResult<T> = std::result::Result<T, NormalizeError>;

#[cfg(feature = "heif")]
mod imp {
    use super::HeifResult;
    use crate::engine::check_dimensions;
    use crate::engine::common::run_with_panic_policy;
    use crate::error::NormalizeError;
    use crate::raster::{PixelLayout, Raster};
    use libheif_rs::{ColorSpace, HeifContext, ImageHandle, LibHeif, RgbChroma};

    fn malformed(stage: &str, err: impl std::fmt::Display) -> NormalizeError {
        NormalizeError::malformed_stream(format!("heif: {stage}: {err}"))
    }

    fn primary_handle(ctx: &HeifContext<'_>) -> HeifResult<ImageHandle> {
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| malformed("primary image handle", e))?;
        let (width, height) = (handle.width(), handle.height());
        if width == 0 || height == 0 {
            return Err(NormalizeError::malformed_stream(format!(
                "heif: zero-area image {width}x{height}"
            )));
        }
        check_dimensions(width, height)?;
        Ok(handle)
    }

    pub fn heif_dimensions(data: &[u8]) -> HeifResult<(u32, u32)> {
        run_with_panic_policy("config:libheif", || {
            let ctx = HeifContext::read_from_bytes(data).map_err(|e| malformed("read", e))?;
            let handle = primary_handle(&ctx)?;
            Ok((handle.width(), handle.height()))
        })
    }

    /// Decode the primary image. libheif applies the container's rotation
    /// and mirror properties during decode, so the result is upright.
    pub fn decode_heif(data: &[u8]) -> HeifResult<Raster> {
        run_with_panic_policy("decode:libheif", || {
            let lib_heif = LibHeif::new();
            let ctx = HeifContext::read_from_bytes(data).map_err(|e| malformed("read", e))?;
            let handle = primary_handle(&ctx)?;

            let (chroma, layout) = if handle.has_alpha_channel() {
                (RgbChroma::Rgba, PixelLayout::Rgba)
            } else {
                (RgbChroma::Rgb, PixelLayout::Rgb)
            };
            let image = lib_heif
                .decode(&handle, ColorSpace::Rgb(chroma), None)
                .map_err(|e| malformed("decode", e))?;

            let planes = image.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| NormalizeError::malformed_stream("heif: no interleaved plane"))?;
            tracing::debug!(
                width = plane.width,
                height = plane.height,
                stride = plane.stride,
                "heif decoded"
            );
            Raster::from_raw(
                plane.width,
                plane.height,
                plane.stride,
                layout,
                plane.data.to_vec(),
            )
        })
    }
}

#[cfg(not(feature = "heif"))]
mod imp {
    use super::HeifResult;
    use crate::error::NormalizeError;
    use crate::raster::Raster;

    fn disabled() -> NormalizeError {
        NormalizeError::unsupported_format("heif (built without the `heif` feature)")
    }

    pub fn heif_dimensions(_data: &[u8]) -> HeifResult<(u32, u32)> {
        Err(disabled())
    }

    pub fn decode_heif(_data: &[u8]) -> HeifResult<Raster> {
        Err(disabled())
    }
}

/// Header dimensions of the primary image.
pub fn heif_dimensions(data: &[u8]) -> HeifResult<(u32, u32)> {
    imp::heif_dimensions(data)
}

/// Full-resolution RGB(A) raster of the primary image.
pub fn decode_heif(data: &[u8]) -> HeifResult<Raster> {
    imp::decode_heif(data)
}
