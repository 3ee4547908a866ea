// src/engine/decoder.rs
//
// Generic decode path: PNG (zune-png), WebP (libwebp), TIFF/GIF/BMP (image
// crate), HEIF (libheif). Every decoder returns a full-resolution raster;
// scaling happens afterwards in the resampler.

use crate::codecs::heif;
use crate::engine::common::{run_with_panic_policy, EngineResult};
use crate::engine::sniff::FormatTag;
use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::NormalizeError;
use crate::raster::Raster;
use image::{
    ColorType, DynamicImage, GrayAlphaImage, GrayImage, ImageDecoder, ImageFormat, ImageReader,
    RgbImage, RgbaImage,
};
use std::io::Cursor;
use tracing::debug;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::bytestream::ZCursor;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

/// Color model reported by a header-only inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorModel {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
    YCbCr,
    Cmyk,
    Paletted,
    Other,
}

/// Result of [`decode_config`](crate::decode_config).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
    pub format: FormatTag,
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> EngineResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(NormalizeError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(NormalizeError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Header-dimension gate run before any pixel buffer is allocated:
/// zero-area images are malformed, oversized ones hit the limits.
pub(crate) fn validate_header_dimensions(
    codec: &'static str,
    width: u32,
    height: u32,
) -> EngineResult<()> {
    if width == 0 || height == 0 {
        return Err(NormalizeError::malformed_stream(format!(
            "{codec}: zero-area image {width}x{height}"
        )));
    }
    check_dimensions(width, height)
}

/// Decode any non-JPEG format at full resolution.
pub fn decode_generic(bytes: &[u8], format: FormatTag) -> EngineResult<Raster> {
    debug!(%format, len = bytes.len(), "generic decode");
    match format {
        FormatTag::Png => decode_png_zune(bytes),
        FormatTag::WebP => decode_webp_libwebp(bytes),
        FormatTag::Tiff => decode_with_image_crate(bytes, ImageFormat::Tiff),
        FormatTag::Gif => decode_with_image_crate(bytes, ImageFormat::Gif),
        FormatTag::Bmp => decode_with_image_crate(bytes, ImageFormat::Bmp),
        // Not routed here by the orchestrator, but decodable all the same.
        FormatTag::Jpeg => decode_with_image_crate(bytes, ImageFormat::Jpeg),
        FormatTag::Heif => heif::decode_heif(bytes),
    }
}

/// Decode PNG using zune-png. 16-bit input is stripped to 8-bit.
pub fn decode_png_zune(data: &[u8]) -> EngineResult<Raster> {
    run_with_panic_policy("decode:png", || {
        // zune caps dimensions at 16384 by default; check_dimensions owns the limits.
        let options = DecoderOptions::default()
            .png_set_strip_to_8bit(true)
            .set_max_width(u32::MAX as usize)
            .set_max_height(u32::MAX as usize);
        let mut decoder = PngDecoder::new_with_options(ZCursor::new(data), options);
        decoder
            .decode_headers()
            .map_err(|e| NormalizeError::malformed_stream(format!("png: header: {e:?}")))?;
        let (width, height) = decoder
            .dimensions()
            .ok_or_else(|| NormalizeError::malformed_stream("png: missing header info"))?;
        let (width, height) = (width as u32, height as u32);
        validate_header_dimensions("png", width, height)?;

        let pixels = decoder
            .decode()
            .map_err(|e| NormalizeError::malformed_stream(format!("png: decode failed: {e:?}")))?;
        let buf = match pixels {
            zune_core::result::DecodingResult::U8(v) => v,
            _ => {
                return Err(NormalizeError::malformed_stream(
                    "png: unexpected non-U8 pixel buffer",
                ))
            }
        };

        let colorspace = decoder
            .colorspace()
            .ok_or_else(|| NormalizeError::malformed_stream("png: missing colorspace"))?;

        let built = match colorspace {
            ColorSpace::Luma => GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8),
            ColorSpace::LumaA => {
                GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8)
            }
            ColorSpace::RGB => RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8),
            other => {
                return Err(NormalizeError::unsupported_pixel_layout(
                    format!("{other:?}"),
                    "png decode",
                ))
            }
        };
        let img = built.ok_or_else(|| {
            NormalizeError::malformed_stream(format!(
                "png: pixel buffer does not match {width}x{height} {colorspace:?}"
            ))
        })?;
        Ok(Raster::from_dynamic(img))
    })
}

/// Decode WebP using libwebp (via webp crate). Falls back to image crate for
/// animated WebP, which yields the first frame.
pub fn decode_webp_libwebp(data: &[u8]) -> EngineResult<Raster> {
    run_with_panic_policy("decode:webp", || {
        // Parse header first to avoid allocating huge buffers on malformed files
        let features = BitstreamFeatures::new(data).ok_or_else(|| {
            NormalizeError::malformed_stream("webp: failed to read bitstream features")
        })?;
        validate_header_dimensions("webp", features.width(), features.height())?;

        if features.has_animation() {
            debug!("animated webp, decoding first frame via image crate");
            return decode_with_image_crate(data, ImageFormat::WebP);
        }

        let decoded = WebPDecoder::new(data)
            .decode()
            .ok_or_else(|| NormalizeError::malformed_stream("webp: decode failed"))?;
        check_dimensions(decoded.width(), decoded.height())?;
        Ok(Raster::from_dynamic(decoded.to_image()))
    })
}

fn image_reader(data: &[u8], format: ImageFormat) -> ImageReader<Cursor<&[u8]>> {
    let mut reader = ImageReader::new(Cursor::new(data));
    reader.set_format(format);
    reader
}

/// Decode with the image crate, checking header dimensions before the
/// pixel buffer is allocated. Multi-frame containers yield the first frame.
pub fn decode_with_image_crate(data: &[u8], format: ImageFormat) -> EngineResult<Raster> {
    let codec = format.extensions_str().first().copied().unwrap_or("image");
    run_with_panic_policy("decode:image", || {
        let decoder = image_reader(data, format)
            .into_decoder()
            .map_err(|e| NormalizeError::malformed_stream(format!("{codec}: header: {e}")))?;
        let (width, height) = decoder.dimensions();
        validate_header_dimensions("image", width, height)?;
        let img = DynamicImage::from_decoder(decoder)
            .map_err(|e| NormalizeError::malformed_stream(format!("{codec}: decode failed: {e}")))?;
        Ok(Raster::from_dynamic(img))
    })
}

fn color_model_of(color: ColorType) -> ColorModel {
    match color {
        ColorType::L8 | ColorType::L16 => ColorModel::Gray,
        ColorType::La8 | ColorType::La16 => ColorModel::GrayAlpha,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorModel::Rgb,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorModel::Rgba,
        _ => ColorModel::Other,
    }
}

// IHDR color type 3 is an indexed image; the image crate expands the
// palette before reporting, so read it from the header directly.
fn png_is_paletted(data: &[u8]) -> bool {
    data.len() > 25 && &data[12..16] == b"IHDR" && data[25] == 3
}

/// Header-only inspection for every format except JPEG and HEIF.
pub fn image_config(data: &[u8], format: FormatTag) -> EngineResult<ImageConfig> {
    let image_format = match format {
        FormatTag::Png => ImageFormat::Png,
        FormatTag::WebP => ImageFormat::WebP,
        FormatTag::Tiff => ImageFormat::Tiff,
        FormatTag::Gif => ImageFormat::Gif,
        FormatTag::Bmp => ImageFormat::Bmp,
        FormatTag::Jpeg => ImageFormat::Jpeg,
        FormatTag::Heif => {
            let (width, height) = heif::heif_dimensions(data)?;
            return Ok(ImageConfig {
                width,
                height,
                color_model: ColorModel::YCbCr,
                format,
            });
        }
    };
    let decoder = image_reader(data, image_format)
        .into_decoder()
        .map_err(|e| NormalizeError::malformed_stream(format!("{format}: header: {e}")))?;
    let (width, height) = decoder.dimensions();
    let color_model = match format {
        FormatTag::Gif => ColorModel::Paletted,
        FormatTag::Png if png_is_paletted(data) => ColorModel::Paletted,
        _ => color_model_of(decoder.color_type()),
    };
    Ok(ImageConfig {
        width,
        height,
        color_model,
        format,
    })
}
