// src/engine/colorspace.rs
//
// Reduce a raster to single-channel luma.

use crate::raster::{PixelLayout, Raster};

// BT.601 weights in 16.16 fixed point. These are the weights libjpeg uses
// for Y when decoding straight to grayscale, so the JPEG fast path and the
// generic path produce the same gray levels. They sum to 65536, so a
// neutral pixel maps to itself.
const LUMA_R: u32 = 19595;
const LUMA_G: u32 = 38470;
const LUMA_B: u32 = 7471;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32 + (1 << 15)) >> 16) as u8
}

#[inline]
fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u32 * a as u32 + 127) / 255) as u8
}

/// Convert to a packed 1-channel raster (`stride == width`).
///
/// RGBA pixels are premultiplied by alpha first, so fully transparent areas
/// come out black. Gray input is copied with padding stripped, which makes
/// the reduction idempotent.
pub fn to_gray(raster: Raster) -> Raster {
    let (width, height) = raster.dimensions();
    if raster.layout() == PixelLayout::Gray && raster.is_packed() {
        return raster;
    }

    let mut out = Vec::with_capacity(width as usize * height as usize);
    for row in raster.rows() {
        match raster.layout() {
            PixelLayout::Gray => out.extend_from_slice(row),
            PixelLayout::Rgb => {
                out.extend(row.chunks_exact(3).map(|px| luma(px[0], px[1], px[2])));
            }
            PixelLayout::Rgba => {
                out.extend(row.chunks_exact(4).map(|px| {
                    let a = px[3];
                    luma(
                        premultiply(px[0], a),
                        premultiply(px[1], a),
                        premultiply(px[2], a),
                    )
                }));
            }
        }
    }

    // One byte per pixel, `height` rows.
    Raster::packed(width, height, PixelLayout::Gray, out)
}
