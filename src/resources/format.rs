//! Pixel format capability fallback
//!
//! A requested format the device cannot sample from is substituted by a
//! registered replacement format, with a conversion function applied
//! transparently to the pixel data at upload time. The registry ships one
//! entry (RGB substituted by RGBA) and accepts further registrations.

use thiserror::Error;

use crate::backend::controller::DeviceCapabilities;
use crate::backend::types::{FormatFeatures, FormatTiling, PixelFormat};

/// Errors from texture creation and upload
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("Pixel format {0:?} is unsupported and has no registered conversion")]
    UnsupportedFormat(PixelFormat),
    #[error("Texture has not been initialised")]
    NotInitialised,
    #[error("Copy region exceeds the image bounds")]
    RegionOutOfBounds,
    #[error("Pixel data size {actual} does not match the region ({expected} bytes)")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Converts a whole pixel buffer into a newly allocated buffer
pub type BufferConversionFn = fn(&[u8]) -> Vec<u8>;

/// Converts one row of pixels into a destination slice, for direct-mapped
/// uploads that write straight into image memory
pub type InPlaceConversionFn = fn(&[u8], &mut [u8]);

/// One registered format substitution
#[derive(Clone, Copy)]
pub struct FormatConversion {
    pub old_format: PixelFormat,
    pub new_format: PixelFormat,
    pub convert_buffer: BufferConversionFn,
    pub convert_in_place: InPlaceConversionFn,
}

impl std::fmt::Debug for FormatConversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatConversion")
            .field("old_format", &self.old_format)
            .field("new_format", &self.new_format)
            .finish()
    }
}

/// Registry of format substitutions consulted when a requested format is
/// unsupported by the device
#[derive(Debug)]
pub struct FormatConversionRegistry {
    entries: Vec<FormatConversion>,
}

impl FormatConversionRegistry {
    pub fn new() -> Self {
        Self {
            entries: vec![FormatConversion {
                old_format: PixelFormat::R8G8B8Unorm,
                new_format: PixelFormat::R8G8B8A8Unorm,
                convert_buffer: convert_rgb24_to_rgba32,
                convert_in_place: convert_rgb24_to_rgba32_in_place,
            }],
        }
    }

    pub fn register(&mut self, conversion: FormatConversion) {
        self.entries.push(conversion);
    }

    pub fn find(&self, old_format: PixelFormat) -> Option<&FormatConversion> {
        self.entries.iter().find(|e| e.old_format == old_format)
    }
}

impl Default for FormatConversionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of validating a requested format against the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedFormat {
    /// The format the image will actually use
    pub format: PixelFormat,
    /// Set when uploads must convert from the originally requested format
    pub convert_from: Option<PixelFormat>,
}

/// Check that the device can sample `requested` for the given tiling; fall
/// back to a registered substitution when it cannot.
pub fn validate_format(
    requested: PixelFormat,
    tiling: FormatTiling,
    capabilities: &dyn DeviceCapabilities,
    registry: &FormatConversionRegistry,
) -> Result<ValidatedFormat, TextureError> {
    let features = capabilities.format_features(requested, tiling);
    if features.contains(FormatFeatures::SAMPLED_IMAGE) {
        return Ok(ValidatedFormat {
            format: requested,
            convert_from: None,
        });
    }
    match registry.find(requested) {
        Some(conversion) => {
            log::warn!(
                "Pixel format {:?} unsupported, substituting {:?}",
                requested,
                conversion.new_format
            );
            Ok(ValidatedFormat {
                format: conversion.new_format,
                convert_from: Some(requested),
            })
        }
        None => Err(TextureError::UnsupportedFormat(requested)),
    }
}

/// Expand 3-byte RGB pixels to 4-byte RGBA, inserting opaque alpha
pub fn convert_rgb24_to_rgba32(src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0u8; src.len() / 3 * 4];
    convert_rgb24_to_rgba32_in_place(src, &mut dst);
    dst
}

/// Same expansion writing into an existing destination slice
pub fn convert_rgb24_to_rgba32_in_place(src: &[u8], dst: &mut [u8]) {
    for (rgb, rgba) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
        rgba[0] = rgb[0];
        rgba[1] = rgb[1];
        rgba[2] = rgb[2];
        rgba[3] = 0xFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::controller::NullCapabilities;

    /// Capabilities reporting zero feature flags for every format
    struct NoSupportCapabilities;

    impl DeviceCapabilities for NoSupportCapabilities {
        fn format_features(&self, _format: PixelFormat, _tiling: FormatTiling) -> FormatFeatures {
            FormatFeatures::empty()
        }
    }

    #[test]
    fn test_supported_format_passes_through() {
        let registry = FormatConversionRegistry::new();
        let validated = validate_format(
            PixelFormat::R8G8B8A8Unorm,
            FormatTiling::Optimal,
            &NullCapabilities,
            &registry,
        )
        .unwrap();
        assert_eq!(validated.format, PixelFormat::R8G8B8A8Unorm);
        assert_eq!(validated.convert_from, None);
    }

    #[test]
    fn test_rgb_falls_back_to_rgba() {
        let registry = FormatConversionRegistry::new();
        let validated = validate_format(
            PixelFormat::R8G8B8Unorm,
            FormatTiling::Optimal,
            &NoSupportCapabilities,
            &registry,
        )
        .unwrap();
        assert_eq!(validated.format, PixelFormat::R8G8B8A8Unorm);
        assert_eq!(validated.convert_from, Some(PixelFormat::R8G8B8Unorm));
    }

    #[test]
    fn test_unregistered_format_fails() {
        let registry = FormatConversionRegistry::new();
        let result = validate_format(
            PixelFormat::R5G6B5UnormPack16,
            FormatTiling::Optimal,
            &NoSupportCapabilities,
            &registry,
        );
        assert_eq!(
            result,
            Err(TextureError::UnsupportedFormat(
                PixelFormat::R5G6B5UnormPack16
            ))
        );
    }

    #[test]
    fn test_registry_is_extensible() {
        let mut registry = FormatConversionRegistry::new();
        registry.register(FormatConversion {
            old_format: PixelFormat::R8Unorm,
            new_format: PixelFormat::R8G8B8A8Unorm,
            convert_buffer: |src| src.iter().flat_map(|&r| [r, 0, 0, 0xFF]).collect(),
            convert_in_place: |src, dst| {
                for (&r, rgba) in src.iter().zip(dst.chunks_exact_mut(4)) {
                    rgba.copy_from_slice(&[r, 0, 0, 0xFF]);
                }
            },
        });
        let validated = validate_format(
            PixelFormat::R8Unorm,
            FormatTiling::Linear,
            &NoSupportCapabilities,
            &registry,
        )
        .unwrap();
        assert_eq!(validated.format, PixelFormat::R8G8B8A8Unorm);
    }

    #[test]
    fn test_convert_rgb_preserves_channels_and_sets_alpha() {
        let src = [1u8, 2, 3, 10, 20, 30, 100, 150, 200];
        let dst = convert_rgb24_to_rgba32(&src);
        assert_eq!(
            dst,
            vec![1, 2, 3, 0xFF, 10, 20, 30, 0xFF, 100, 150, 200, 0xFF]
        );
    }
}
