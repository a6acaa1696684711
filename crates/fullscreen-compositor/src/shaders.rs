//! Embedded WGSL variants of the compositor stage
//!
//! The sources are assembled and validated by the build script.

use crate::descriptor::{EdgePolicy, FragmentMode};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/shaders.rs"));
}

/// Selects the shader variant for a fragment mode and edge policy
///
/// The debug gradient never reads the source image, so the edge policy does not apply to it.
pub fn source_for(mode: FragmentMode, edge_policy: EdgePolicy) -> &'static str {
    match (mode, edge_policy) {
        (FragmentMode::DebugGradient, _) => generated::DEBUG_GRADIENT,
        (FragmentMode::Passthrough, EdgePolicy::Clamp) => generated::PASSTHROUGH_CLAMP,
        (FragmentMode::Passthrough, EdgePolicy::Repeat) => generated::PASSTHROUGH_REPEAT,
        (FragmentMode::Passthrough, EdgePolicy::Transparent) => generated::PASSTHROUGH_TRANSPARENT,
    }
}
