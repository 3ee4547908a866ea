// src/ops.rs
//
// Per-call configuration values.
// These are cheap to create and copy - the expensive work happens in engine::transform().

use crate::error::NormalizeError;

/// Resampling kernel handed to the Resampler on the generic path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeKernel {
    Nearest,
    Bilinear,
    /// Bicubic with a = -0.5. Sharp enough for text, no ringing halos.
    #[default]
    CatmullRom,
    Mitchell,
    Lanczos3,
}

/// Options for a single `transform` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Reduce the output to a single luma channel
    pub grayscale: bool,
    /// Filter used when the image has to be resampled after decode
    pub kernel: ResizeKernel,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    pub fn kernel(mut self, kernel: ResizeKernel) -> Self {
        self.kernel = kernel;
        self
    }
}

/// Output format for encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// JPEG quality used when the caller does not pass one
    pub const DEFAULT_JPEG_QUALITY: u8 = 80;

    pub fn from_str(format: &str) -> Result<Self, NormalizeError> {
        match format.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            other => Err(NormalizeError::unsupported_format(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }
}
