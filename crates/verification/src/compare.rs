//! Image comparison utilities for verification
//!
//! Compares the CPU reference output with the image read back from the GPU.

/// Result of comparing two images
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareResult {
    /// Images match exactly
    Match,
    /// Images have different dimensions
    DimensionMismatch {
        /// Dimensions of the reference output
        reference_dimensions: (u32, u32),
        /// Dimensions of the GPU output
        gpu_dimensions: (u32, u32),
    },
    /// Images have matching dimensions but different pixel values
    PixelMismatch {
        /// Number of pixels with at least one differing channel
        mismatched_pixels: usize,
        /// First differing pixel in row-major order
        first_mismatch: (u32, u32),
        /// Largest absolute difference over all channels
        max_difference: f32,
        /// Whether each RGBA channel matched across the whole image
        channels_matched: [bool; 4],
    },
}

impl CompareResult {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Compares two RGBA32F images pixel by pixel
///
/// Comparison is bitwise on the channel values, so any rounding difference counts as a mismatch.
///
/// # Arguments
/// * `reference` - Output of the CPU reference engine
/// * `gpu_output` - Render target read back from the GPU
///
/// # Returns
/// A `CompareResult` describing whether the images match and where they first differ
pub fn compare_images(reference: &image::Rgba32FImage, gpu_output: &image::Rgba32FImage) -> CompareResult {
    if reference.dimensions() != gpu_output.dimensions() {
        return CompareResult::DimensionMismatch {
            reference_dimensions: reference.dimensions(),
            gpu_dimensions: gpu_output.dimensions(),
        };
    }

    let mut channels_matched = [true; 4];
    let mut mismatched_pixels = 0;
    let mut first_mismatch = None;
    let mut max_difference = 0.0f32;

    for ((x, y, expected), actual) in reference.enumerate_pixels().zip(gpu_output.pixels()) {
        let mut pixel_matched = true;
        for channel in 0..4 {
            if expected[channel].to_bits() != actual[channel].to_bits() {
                channels_matched[channel] = false;
                pixel_matched = false;
                max_difference = max_difference.max((expected[channel] - actual[channel]).abs());
            }
        }
        if !pixel_matched {
            mismatched_pixels += 1;
            first_mismatch.get_or_insert((x, y));
        }
    }

    match first_mismatch {
        None => CompareResult::Match,
        Some(first_mismatch) => CompareResult::PixelMismatch {
            mismatched_pixels,
            first_mismatch,
            max_difference,
            channels_matched,
        },
    }
}
