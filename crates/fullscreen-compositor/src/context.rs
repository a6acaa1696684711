//! Headless GPU context
//!
//! Window and surface management belong to the embedding application. The compositor itself
//! only needs a device and a queue, which this module provides for the CLI, the verification
//! tooling and the GPU tests.

use crate::error::{CompositorError, Result};

/// Float color formats tried, in order, when a render target must hold unnormalized values
pub const FLOAT_RENDER_FORMATS: [wgpu::TextureFormat; 2] = [wgpu::TextureFormat::Rgba32Float, wgpu::TextureFormat::Rgba16Float];

/// Device and queue without a presentation surface
#[derive(Debug)]
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Requests a high-performance adapter, falling back to a software adapter if none exists
    pub async fn new_headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::warn!("No hardware adapter ({e}), trying fallback adapter");
                instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::LowPower,
                        compatible_surface: None,
                        force_fallback_adapter: true,
                    })
                    .await?
            }
        };

        let adapter_info = adapter.get_info();
        tracing::info!(name = %adapter_info.name, backend = ?adapter_info.backend, "Selected GPU adapter");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Fullscreen Compositor"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: Default::default(),
            })
            .await?;

        Ok(Self {
            adapter,
            device,
            queue,
            adapter_info,
        })
    }

    /// Blocking variant of [`GpuContext::new_headless`]
    pub fn new_headless_blocking() -> Result<Self> {
        pollster::block_on(Self::new_headless())
    }

    /// Capabilities of `format` on this device
    ///
    /// Without `TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES` a WebGPU-compliant device only grants the
    /// guaranteed features. Downlevel adapters (software rasterizers among them) report their own.
    pub fn format_features(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures {
        let adapter_specific = self.device.features().contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES)
            || !self.adapter.get_downlevel_capabilities().is_webgpu_compliant();

        if adapter_specific {
            self.adapter.get_texture_format_features(format)
        } else {
            format.guaranteed_format_features(self.device.features())
        }
    }

    /// Checks that `format` can be used as a color attachment on this device
    pub fn check_render_target(&self, format: wgpu::TextureFormat) -> Result<()> {
        let allowed = self.format_features(format).allowed_usages;
        if !allowed.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(CompositorError::OutputFormatNotRenderable {
                format,
                reason: format!("allowed usages are {allowed:?}"),
            });
        }
        Ok(())
    }

    /// Returns the first entry of [`FLOAT_RENDER_FORMATS`] this device can render to
    ///
    /// `Rgba32Float` keeps the source bit-exact; `Rgba16Float` is the fallback on adapters that only
    /// sample 32-bit float textures.
    pub fn float_render_format(&self) -> Result<wgpu::TextureFormat> {
        let format = FLOAT_RENDER_FORMATS
            .into_iter()
            .find(|&format| self.check_render_target(format).is_ok())
            .ok_or_else(|| CompositorError::NoRenderableFloatFormat {
                tried: FLOAT_RENDER_FORMATS.to_vec(),
            })?;

        tracing::debug!(?format, "Selected float render format");
        Ok(format)
    }
}
