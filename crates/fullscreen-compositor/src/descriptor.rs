//! Compositor stage configuration
//!
//! A `CompositorDescriptor` fixes everything the pipeline build needs: the two entry points,
//! the fragment mode, the out-of-bounds edge policy and the output pixel format. It is
//! immutable once constructed.

use crate::error::{CompositorError, Result};
use serde::{Deserialize, Serialize};

/// Vertex stage entry point shared by every variant
pub const VERTEX_ENTRY_POINT: &str = "vert_main";
/// Fragment entry point of the pass-through compositor
pub const PASSTHROUGH_ENTRY_POINT: &str = "frag_main";
/// Fragment entry point of the debug gradient scaffold
pub const DEBUG_GRADIENT_ENTRY_POINT: &str = "frag_debug";

/// Bind group index of the source image slot
pub const SOURCE_GROUP: u32 = 0;
/// Binding index of the source image slot
pub const SOURCE_BINDING: u32 = 0;

/// What the fragment stage computes for each covered pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentMode {
    /// Diagnostic output: (x, y, 0.1, 1.0) in window coordinates
    DebugGradient,
    /// Copy the source texel under each pixel to the target
    #[default]
    Passthrough,
}

impl FragmentMode {
    /// Returns the human-readable name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            FragmentMode::DebugGradient => "debug-gradient",
            FragmentMode::Passthrough => "passthrough",
        }
    }

    /// Whether this mode reads from the source image slot
    pub fn reads_source(&self) -> bool {
        matches!(self, FragmentMode::Passthrough)
    }
}

/// Resolution of source coordinates that fall outside the bound image
///
/// Filtering is always an exact integer texel fetch; only the edge behaviour is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Clamp to the nearest edge texel
    #[default]
    Clamp,
    /// Wrap around modulo the image size
    Repeat,
    /// Transparent black outside the image
    Transparent,
}

impl EdgePolicy {
    /// Returns the human-readable name of this policy
    pub fn name(&self) -> &'static str {
        match self {
            EdgePolicy::Clamp => "clamp",
            EdgePolicy::Repeat => "repeat",
            EdgePolicy::Transparent => "transparent",
        }
    }
}

/// Immutable configuration of one compositor stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorDescriptor {
    label: String,
    mode: FragmentMode,
    edge_policy: EdgePolicy,
    output_format: wgpu::TextureFormat,
}

impl CompositorDescriptor {
    /// Pass-through compositor writing into `output_format`, clamping at the image edges
    pub fn passthrough(output_format: wgpu::TextureFormat) -> Self {
        Self::new(FragmentMode::Passthrough, output_format)
    }

    /// Debug gradient scaffold writing into `output_format`
    pub fn debug_gradient(output_format: wgpu::TextureFormat) -> Self {
        Self::new(FragmentMode::DebugGradient, output_format)
    }

    /// Creates a descriptor for `mode` with the default edge policy and a label derived from the mode
    ///
    /// # Arguments
    /// * `mode` - What the fragment stage computes for each pixel
    /// * `output_format` - Format of every render target this stage will draw into
    pub fn new(mode: FragmentMode, output_format: wgpu::TextureFormat) -> Self {
        Self {
            label: format!("Fullscreen Compositor ({})", mode.name()),
            mode,
            edge_policy: EdgePolicy::default(),
            output_format,
        }
    }

    /// Replaces the edge policy; ignored by the debug gradient
    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    /// Replaces the debug label given to every wgpu object the stage creates
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mode(&self) -> FragmentMode {
        self.mode
    }

    pub fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    /// Format the pipeline's single color target is declared with
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    /// Name of the WGSL vertex entry point, the same for every mode
    pub fn vertex_entry_point(&self) -> &'static str {
        VERTEX_ENTRY_POINT
    }

    /// Name of the WGSL fragment entry point selected by the mode
    pub fn fragment_entry_point(&self) -> &'static str {
        match self.mode {
            FragmentMode::DebugGradient => DEBUG_GRADIENT_ENTRY_POINT,
            FragmentMode::Passthrough => PASSTHROUGH_ENTRY_POINT,
        }
    }

    /// Embedded WGSL source implementing this descriptor's mode and edge policy
    pub fn shader_source(&self) -> &'static str {
        crate::shaders::source_for(self.mode, self.edge_policy)
    }

    /// Checks the parts of the configuration that do not depend on a device
    ///
    /// Both fragment entry points return `vec4<f32>`, so the output must be an uncompressed
    /// color format sampled as float. Whether the device can render to it is checked when
    /// the pipeline is built.
    ///
    /// # Returns
    /// `Ok(())` if the output format can hold the fragment stage's result
    pub fn validate(&self) -> Result<()> {
        let format = self.output_format;
        if format.is_depth_stencil_format() {
            return Err(CompositorError::OutputFormatNotColor { format });
        }
        if format.is_compressed() {
            return Err(CompositorError::OutputFormatCompressed { format });
        }
        if !matches!(format.sample_type(None, None), Some(wgpu::TextureSampleType::Float { .. })) {
            return Err(CompositorError::OutputFormatNotFloat { format });
        }
        Ok(())
    }
}
