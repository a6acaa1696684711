//! CPU reference engine for the compositor stage
//!
//! Rasterizes the full-screen triangle on the CPU, sampling at pixel centers, and runs the
//! host-side fragment mirrors for every covered pixel. The result is what a conforming GPU
//! must produce for the same descriptor and source image.

use fullscreen_compositor::{
    CompositorDescriptor, CompositorError, FragmentMode, fragment,
    vertex::{self, VERTEX_COUNT},
};

/// Errors produced while generating reference output
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error(transparent)]
    Compositor(#[from] CompositorError),

    /// The reference engine cannot reproduce conversion into this output format
    #[error("reference engine does not support output format {format:?}")]
    UnsupportedFormat { format: wgpu::TextureFormat },

    /// A pixel center fell outside the rasterized triangle
    #[error("pixel ({x}, {y}) is not covered by the full-screen triangle")]
    Uncovered { x: u32, y: u32 },
}

/// Converts a clip-space position to window coordinates for a `width`x`height` viewport
///
/// Window space has its origin at the top-left corner with y pointing down.
pub fn clip_to_window(position: [f32; 4], width: u32, height: u32) -> [f32; 2] {
    let ndc = [position[0] / position[3], position[1] / position[3]];
    [(ndc[0] * 0.5 + 0.5) * width as f32, (0.5 - ndc[1] * 0.5) * height as f32]
}

/// Rounds a normalized value the way an 8-bit unorm render target stores it
fn quantize_unorm8(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

/// Rounds a value to the nearest half-precision float
fn quantize_f16(value: f32) -> f32 {
    half::f16::from_f32(value).to_f32()
}

/// Software implementation of the compositor stage
#[derive(Debug, Clone)]
pub struct ReferenceEngine {
    descriptor: CompositorDescriptor,
}

impl ReferenceEngine {
    /// Creates a reference engine for `descriptor`
    ///
    /// Only output formats whose storage the engine can reproduce exactly are accepted:
    /// `Rgba32Float`, `Rgba16Float` and `Rgba8Unorm`.
    pub fn new(descriptor: CompositorDescriptor) -> Result<Self, VerificationError> {
        descriptor.validate()?;
        match descriptor.output_format() {
            wgpu::TextureFormat::Rgba32Float | wgpu::TextureFormat::Rgba16Float | wgpu::TextureFormat::Rgba8Unorm => Ok(Self { descriptor }),
            format => Err(VerificationError::UnsupportedFormat { format }),
        }
    }

    pub fn descriptor(&self) -> &CompositorDescriptor {
        &self.descriptor
    }

    /// Renders the stage into a `width`x`height` image
    ///
    /// # Arguments
    /// * `source` - Image bound to the pass-through stage; ignored by the debug gradient
    /// * `width`, `height` - Size of the render target
    ///
    /// # Returns
    /// Every pixel as the GPU stores it in the descriptor's output format
    pub fn render(&self, source: Option<&image::Rgba32FImage>, width: u32, height: u32) -> Result<image::Rgba32FImage, VerificationError> {
        let source = match (self.descriptor.mode(), source) {
            (FragmentMode::Passthrough, None) => return Err(CompositorError::MissingSourceImage.into()),
            (FragmentMode::Passthrough, Some(source)) => Some(source),
            (FragmentMode::DebugGradient, _) => None,
        };

        let mut triangle = [[0.0f32; 2]; VERTEX_COUNT as usize];
        for (index, corner) in triangle.iter_mut().enumerate() {
            *corner = clip_to_window(vertex::vert_main(index as u32), width, height);
        }

        let mut output = image::Rgba32FImage::new(width, height);
        for (x, y, pixel) in output.enumerate_pixels_mut() {
            let position = fragment::pixel_center(x, y);
            if !vertex::triangle_contains(&triangle, [position[0], position[1]]) {
                return Err(VerificationError::Uncovered { x, y });
            }

            let color = match source {
                Some(source) => fragment::passthrough(source, position, self.descriptor.edge_policy()),
                None => fragment::debug_gradient(position),
            };
            pixel.0 = self.store(color);
        }

        Ok(output)
    }

    /// Applies the conversion performed when writing to the output format
    fn store(&self, color: [f32; 4]) -> [f32; 4] {
        match self.descriptor.output_format() {
            wgpu::TextureFormat::Rgba8Unorm => color.map(quantize_unorm8),
            wgpu::TextureFormat::Rgba16Float => color.map(quantize_f16),
            _ => color,
        }
    }
}
