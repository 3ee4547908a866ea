// src/engine/orientation.rs
//
// EXIF orientation: resolve the tag from raw bytes and undo it on a raster.
// Resolution is best-effort; any metadata problem degrades to TopLeft.

use crate::engine::common::EngineResult;
use crate::raster::Raster;
use image::DynamicImage;
use std::io::Cursor;

/// EXIF orientation codes, named by where row 0 / column 0 of the stored
/// image sit in the visual scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// 1: normal
    #[default]
    TopLeft = 1,
    /// 2: mirrored
    TopRight = 2,
    /// 3: upside down
    BottomRight = 3,
    /// 4: mirrored + upside down
    BottomLeft = 4,
    /// 5: on its side, mirrored (transpose)
    LeftTop = 5,
    /// 6: on its side, needs 90° clockwise
    RightTop = 6,
    /// 7: far side, mirrored (transverse)
    RightBottom = 7,
    /// 8: far side, needs 270° clockwise
    LeftBottom = 8,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::TopLeft,
        Orientation::TopRight,
        Orientation::BottomRight,
        Orientation::BottomLeft,
        Orientation::LeftTop,
        Orientation::RightTop,
        Orientation::RightBottom,
        Orientation::LeftBottom,
    ];

    /// Map an EXIF code; anything outside 1..=8 is `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Orientation::TopLeft),
            2 => Some(Orientation::TopRight),
            3 => Some(Orientation::BottomRight),
            4 => Some(Orientation::BottomLeft),
            5 => Some(Orientation::LeftTop),
            6 => Some(Orientation::RightTop),
            7 => Some(Orientation::RightBottom),
            8 => Some(Orientation::LeftBottom),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Codes 5-8 exchange width and height when corrected.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::LeftTop
                | Orientation::RightTop
                | Orientation::RightBottom
                | Orientation::LeftBottom
        )
    }

    /// The orientation whose correction undoes this one's.
    /// The two quarter turns swap; every other correction is its own inverse.
    pub fn inverse(self) -> Self {
        match self {
            Orientation::RightTop => Orientation::LeftBottom,
            Orientation::LeftBottom => Orientation::RightTop,
            other => other,
        }
    }

    /// Display dimensions of a stored `width x height` image once corrected.
    pub fn corrected_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

/// Read the EXIF Orientation tag from a JPEG or TIFF container.
///
/// Never fails: missing EXIF, a corrupt IFD, or an out-of-range value all
/// yield `TopLeft`.
pub fn resolve_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    let exif = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(err) => {
            tracing::debug!(error = %err, "exif decode failed, assuming top-left orientation");
            return Orientation::TopLeft;
        }
    };
    let Some(field) = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) else {
        return Orientation::TopLeft;
    };
    // exif crate can represent as Short/Long; use get_uint for safety
    match field.value.get_uint(0).and_then(Orientation::from_code) {
        Some(orientation) => orientation,
        None => {
            tracing::warn!(value = %field.display_value(), "unexpected exif orientation value");
            Orientation::TopLeft
        }
    }
}

/// Apply the geometric correction for `orientation` so the raster reads
/// upright. Layout is preserved; dimensions swap for codes 5-8.
pub fn correct_orientation(raster: Raster, orientation: Orientation) -> EngineResult<Raster> {
    if orientation == Orientation::TopLeft {
        return Ok(raster);
    }
    let img = raster.into_dynamic()?;
    Ok(Raster::from_dynamic(apply_to_image(img, orientation)))
}

fn apply_to_image(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::TopLeft => img,
        Orientation::TopRight => img.fliph(),
        Orientation::BottomRight => img.rotate180(),
        // rotate180 ∘ fliph
        Orientation::BottomLeft => img.flipv(),
        // transpose
        Orientation::LeftTop => img.rotate90().fliph(),
        Orientation::RightTop => img.rotate90(),
        // transverse
        Orientation::RightBottom => img.rotate270().fliph(),
        Orientation::LeftBottom => img.rotate270(),
    }
}
