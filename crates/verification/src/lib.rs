//! Verification utilities for the full-screen compositor
//!
//! This crate renders the compositor stage on the CPU and compares the result against the
//! GPU output, pixel for pixel.

pub mod compare;
pub mod reference_engine;

pub use reference_engine::{ReferenceEngine, VerificationError};
