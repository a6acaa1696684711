//! YAML manifests describing a compositor stage
//!
//! ```yaml
//! mode: passthrough
//! edge: repeat
//! output_format: rgba8unorm
//! label: Present
//! ```

use crate::{
    descriptor::{CompositorDescriptor, EdgePolicy, FragmentMode},
    error::Result,
};
use serde::{Deserialize, Serialize};

fn default_output_format() -> wgpu::TextureFormat {
    wgpu::TextureFormat::Rgba32Float
}

/// On-disk form of a `CompositorDescriptor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositorManifest {
    #[serde(default)]
    pub mode: FragmentMode,
    #[serde(default)]
    pub edge: EdgePolicy,
    #[serde(default = "default_output_format")]
    pub output_format: wgpu::TextureFormat,
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for CompositorManifest {
    fn default() -> Self {
        Self {
            mode: FragmentMode::default(),
            edge: EdgePolicy::default(),
            output_format: default_output_format(),
            label: None,
        }
    }
}

impl CompositorManifest {
    /// Parses a manifest, filling omitted fields with their defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_norway::from_str(content)?)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Builds the descriptor; the output format is validated later, by the pipeline build
    pub fn to_descriptor(&self) -> CompositorDescriptor {
        let descriptor = CompositorDescriptor::new(self.mode, self.output_format).with_edge_policy(self.edge);
        match &self.label {
            Some(label) => descriptor.with_label(label.clone()),
            None => descriptor,
        }
    }
}
