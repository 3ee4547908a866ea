// src/raster.rs
//
// Decoded pixel buffer handed from stage to stage.
// Ownership moves through the pipeline; a stage may mutate or replace it.

use crate::error::{NormalizeError, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

/// Interleaved 8-bit pixel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Gray,
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }

    /// Map an interleaved channel count to a layout.
    pub fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(PixelLayout::Gray),
            3 => Some(PixelLayout::Rgb),
            4 => Some(PixelLayout::Rgba),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelLayout::Gray => "gray",
            PixelLayout::Rgb => "rgb",
            PixelLayout::Rgba => "rgba",
        }
    }
}

/// Rectangular pixel buffer with an explicit row stride.
///
/// Invariants: `stride >= width * bytes_per_pixel` and
/// `data.len() >= stride * height`. Rows may carry trailing padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Raster {
    /// Zero-filled packed raster (`stride == width * bpp`).
    pub fn new(width: u32, height: u32, layout: PixelLayout) -> Self {
        let stride = width as usize * layout.bytes_per_pixel();
        Self {
            width,
            height,
            stride,
            layout,
            data: vec![0; stride * height as usize],
        }
    }

    /// Wrap an existing buffer, validating the stride/length invariants.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self> {
        let min_stride = (width as usize)
            .checked_mul(layout.bytes_per_pixel())
            .ok_or_else(|| NormalizeError::invalid_raster("row size overflows usize"))?;
        if stride < min_stride {
            return Err(NormalizeError::invalid_raster(format!(
                "stride {stride} is smaller than {min_stride} bytes for {width} {} pixels",
                layout.as_str()
            )));
        }
        let required = stride
            .checked_mul(height as usize)
            .ok_or_else(|| NormalizeError::invalid_raster("buffer size overflows usize"))?;
        if data.len() < required {
            return Err(NormalizeError::invalid_raster(format!(
                "buffer holds {} bytes, {required} required for {height} rows of stride {stride}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            layout,
            data,
        })
    }

    /// Packed raster over `data`, which the caller sized as
    /// `width * height * bytes_per_pixel`.
    pub(crate) fn packed(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Self {
        let stride = width as usize * layout.bytes_per_pixel();
        debug_assert_eq!(data.len(), stride * height as usize);
        Self {
            width,
            height,
            stride,
            layout,
            data,
        }
    }

    /// Like [`Raster::from_raw`] but takes an interleaved channel count.
    pub fn from_channels(
        width: u32,
        height: u32,
        stride: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let layout = PixelLayout::from_channels(channels).ok_or_else(|| {
            NormalizeError::unsupported_pixel_layout(format!("{channels}-channel"), "raster")
        })?;
        Self::from_raw(width, height, stride, layout, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Raw buffer including any row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    pub fn is_packed(&self) -> bool {
        self.stride == self.row_bytes()
    }

    /// Pixel bytes of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Channel values of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.layout.bytes_per_pixel();
        let start = y as usize * self.stride + x as usize * bpp;
        &self.data[start..start + bpp]
    }

    /// Pixel bytes with padding stripped, row after row.
    pub fn packed_bytes(&self) -> Vec<u8> {
        if self.is_packed() {
            return self.data[..self.row_bytes() * self.height as usize].to_vec();
        }
        let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }

    /// Consume the raster, returning a packed pixel buffer. Zero-copy when
    /// the raster is already packed.
    pub fn into_packed_bytes(self) -> Vec<u8> {
        if self.is_packed() {
            let mut data = self.data;
            data.truncate(self.stride * self.height as usize);
            data
        } else {
            self.packed_bytes()
        }
    }

    /// Convert into an `image` buffer for geometric operations and encoding.
    pub fn into_dynamic(self) -> Result<DynamicImage> {
        let (width, height, layout) = (self.width, self.height, self.layout);
        let pixels = self.into_packed_bytes();
        let img = match layout {
            PixelLayout::Gray => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
            PixelLayout::Rgb => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
            PixelLayout::Rgba => RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8),
        };
        img.ok_or_else(|| NormalizeError::invalid_raster("pixel buffer does not match dimensions"))
    }

    /// Build a packed raster from any decoded `image` buffer. 8-bit Gray/RGB/RGBA
    /// move without copying; other variants are narrowed to the closest 8-bit layout.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (layout, data) = match img {
            DynamicImage::ImageLuma8(buf) => (PixelLayout::Gray, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (PixelLayout::Rgb, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (PixelLayout::Rgba, buf.into_raw()),
            other @ DynamicImage::ImageLuma16(_) => (PixelLayout::Gray, other.to_luma8().into_raw()),
            other if other.color().has_alpha() => (PixelLayout::Rgba, other.to_rgba8().into_raw()),
            other => (PixelLayout::Rgb, other.to_rgb8().into_raw()),
        };
        Self::packed(width, height, layout, data)
    }
}
