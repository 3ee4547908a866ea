// src/error.rs
//
// Unified error handling for ocr-normalize
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid input, recoverable
// - CodecError: Format/decoding/encoding issues
// - ResourceLimit: Dimension limits, native handle allocation
// - InternalBug: Library bugs (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy used by callers to decide whether to retry, skip, or abort
/// the enclosing document-processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Dimension limits, native resource allocation
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }
}

/// ocr-normalize error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("empty input data")]
    EmptyInput,

    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: Cow<'static, str> },

    #[error("Malformed image stream: {message}")]
    MalformedStream { message: Cow<'static, str> },

    /// Non-fatal decoder anomaly. Logged by the decode paths, never returned
    /// from a public operation.
    #[error("Decoder warning: {message}")]
    DecoderWarning { message: Cow<'static, str> },

    #[error("Failed to initialize {codec}: {message}")]
    ResourceInitFailure {
        codec: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Pixel layout {layout} has no encoder mapping for {format}")]
    UnsupportedPixelLayout {
        layout: Cow<'static, str>,
        format: Cow<'static, str>,
    },

    #[error("Invalid raster: {reason}")]
    InvalidRaster { reason: Cow<'static, str> },

    // Size Limit Errors
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    #[error("Resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    // Encode Errors
    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl NormalizeError {
    pub fn empty_input() -> Self {
        Self::EmptyInput
    }

    pub fn unsupported_format(format: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn malformed_stream(message: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedStream {
            message: message.into(),
        }
    }

    pub fn decoder_warning(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecoderWarning {
            message: message.into(),
        }
    }

    pub fn resource_init_failure(
        codec: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResourceInitFailure {
            codec: codec.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_pixel_layout(
        layout: impl Into<Cow<'static, str>>,
        format: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::UnsupportedPixelLayout {
            layout: layout.into(),
            format: format.into(),
        }
    }

    pub fn invalid_raster(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidRaster {
            reason: reason.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (caller can fix the input or free resources)
    ///
    /// Consistent with category():
    /// - UserError and ResourceLimit errors are recoverable
    /// - CodecError and InternalBug errors are not
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyInput | Self::InvalidRaster { .. } => ErrorCategory::UserError,

            Self::UnsupportedFormat { .. }
            | Self::MalformedStream { .. }
            | Self::DecoderWarning { .. }
            | Self::UnsupportedPixelLayout { .. }
            | Self::EncodeFailed { .. }
            // Resampling is a processing failure on decoded pixels, grouped with codec issues.
            | Self::ResizeFailed { .. } => ErrorCategory::CodecError,

            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::ResourceInitFailure { .. } => ErrorCategory::ResourceLimit,

            Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, NormalizeError>;
