// src/engine/sniff.rs
//
// Magic-byte format detection via `image::guess_format`, plus an `ftyp`
// brand scan for HEIF. No extension or content heuristics.

use crate::error::NormalizeError;
use image::ImageFormat;

/// Container formats the pipeline knows how to route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Bmp,
    Gif,
    Png,
    Jpeg,
    Tiff,
    WebP,
    Heif,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Bmp => "bmp",
            FormatTag::Gif => "gif",
            FormatTag::Png => "png",
            FormatTag::Jpeg => "jpeg",
            FormatTag::Tiff => "tiff",
            FormatTag::WebP => "webp",
            FormatTag::Heif => "heif",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ISO-BMFF brands that identify a HEIF still image.
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// AVIF shares the `mif1` brand with HEIF but needs an AV1 decoder.
const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];

/// Identify the container format from the leading bytes.
///
/// The raster formats go through `image::guess_format`; anything it knows
/// that the pipeline cannot route is `UnsupportedFormat`. HEIF has no entry
/// in that table and is matched on its `ftyp` brands. Callers reject empty
/// input with `EmptyInput` before sniffing.
pub fn sniff(bytes: &[u8]) -> Result<FormatTag, NormalizeError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok(FormatTag::Jpeg),
        Ok(ImageFormat::Png) => Ok(FormatTag::Png),
        Ok(ImageFormat::Gif) => Ok(FormatTag::Gif),
        Ok(ImageFormat::WebP) => Ok(FormatTag::WebP),
        Ok(ImageFormat::Tiff) => Ok(FormatTag::Tiff),
        Ok(ImageFormat::Bmp) => Ok(FormatTag::Bmp),
        Ok(other) => Err(NormalizeError::unsupported_format(
            other.extensions_str().first().copied().unwrap_or("unknown"),
        )),
        Err(_) if is_heif(bytes) => Ok(FormatTag::Heif),
        Err(_) => Err(NormalizeError::unsupported_format("unrecognized signature")),
    }
}

// `....ftyp<major>` followed by minor version and compatible brands.
fn is_heif(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    let box_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let major = &bytes[8..12];
    if AVIF_BRANDS.iter().any(|brand| major == &brand[..]) {
        return false;
    }
    if HEIF_BRANDS.iter().any(|brand| major == &brand[..]) {
        return true;
    }
    // Some encoders put a generic major brand first and list heic later.
    let end = box_len.min(bytes.len());
    if end <= 16 {
        return false;
    }
    bytes[16..end]
        .chunks_exact(4)
        .any(|brand| HEIF_BRANDS.iter().any(|known| brand == &known[..]))
}
