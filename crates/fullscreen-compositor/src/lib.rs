//! Full-screen compositor stage for wgpu
//!
//! This crate provides a single post-process stage: a vertex shader that synthesizes a
//! viewport-covering triangle from the vertex index alone, and a fragment shader that copies
//! a bound source image to the render target pixel for pixel (or emits a debug gradient).
//! The draw binds no vertex or index buffer and always issues 3 vertices and 1 instance.

mod compositor;
mod shaders;

pub mod context;
pub mod descriptor;
pub mod error;
pub mod fragment;
pub mod manifest;
pub mod texture;
pub mod vertex;

pub use compositor::{FullscreenCompositor, SourceBinding, validate_source, validate_source_format};
pub use context::GpuContext;
pub use descriptor::{CompositorDescriptor, EdgePolicy, FragmentMode};
pub use error::{CompositorError, Result};
pub use manifest::CompositorManifest;
