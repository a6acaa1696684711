//! Full-screen compositor pipeline
//!
//! Builds the render pipeline for a `CompositorDescriptor`, turns a source texture into an
//! explicit `SourceBinding`, and records the fixed 3-vertex, 1-instance draw that covers every
//! pixel of the target exactly once.

use crate::{
    descriptor::{CompositorDescriptor, SOURCE_BINDING, SOURCE_GROUP},
    error::{CompositorError, Result},
    vertex::{INSTANCE_COUNT, VERTEX_COUNT},
};

/// Clear color of the compositing pass; every pixel is overwritten by the triangle
const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.1, g: 0.2, b: 0.3, a: 1.0 };

/// A source image bound to a compositor's single binding slot
///
/// Holds the bind group for one texture. The texture must not be written by other work
/// while a draw using this binding is in flight.
#[derive(Debug)]
pub struct SourceBinding {
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

impl SourceBinding {
    /// Dimensions of the bound image
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// The compositor stage compiled into a wgpu render pipeline
#[derive(Debug)]
pub struct FullscreenCompositor {
    descriptor: CompositorDescriptor,
    /// Layout of the source slot; `None` when the fragment mode reads no image
    source_layout: Option<wgpu::BindGroupLayout>,
    pipeline: wgpu::RenderPipeline,
}

impl FullscreenCompositor {
    /// Builds the render pipeline for `descriptor`
    ///
    /// # Arguments
    /// * `device` - Device the pipeline is created on
    /// * `descriptor` - Stage configuration; its output format must be renderable on `device`
    ///
    /// # Errors
    /// Returns a configuration error if the output format cannot hold a `vec4<f32>`, or
    /// `OutputFormatNotRenderable` if the device rejects it as a color attachment.
    pub fn new(device: &wgpu::Device, descriptor: CompositorDescriptor) -> Result<Self> {
        descriptor.validate()?;

        // Capture validation failures instead of letting the uncaptured error handler panic
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        tracing::debug!(
            label = descriptor.label(),
            mode = descriptor.mode().name(),
            edge_policy = descriptor.edge_policy().name(),
            format = ?descriptor.output_format(),
            "Building compositor pipeline"
        );

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(descriptor.label()),
            source: wgpu::ShaderSource::Wgsl(descriptor.shader_source().into()),
        });

        let source_layout = descriptor.mode().reads_source().then(|| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(descriptor.label()),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: SOURCE_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        // Texels are fetched with textureLoad, so no filtering is required
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                }],
            })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = source_layout.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(descriptor.label()),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(descriptor.label()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some(descriptor.vertex_entry_point()),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some(descriptor.fragment_entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: descriptor.output_format(),
                    // 32-bit float targets are not blendable; None writes the fragment color unchanged
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            tracing::warn!(format = ?descriptor.output_format(), "Render pipeline rejected: {error}");
            return Err(CompositorError::OutputFormatNotRenderable {
                format: descriptor.output_format(),
                reason: error.to_string(),
            });
        }

        Ok(Self {
            descriptor,
            source_layout,
            pipeline,
        })
    }

    pub fn descriptor(&self) -> &CompositorDescriptor {
        &self.descriptor
    }

    /// Binds `source` to the compositor's read-only image slot
    ///
    /// # Arguments
    /// * `device` - Device the compositor was built on
    /// * `source` - Image read by the pass-through fragment stage
    ///
    /// # Returns
    /// A binding to pass to [`FullscreenCompositor::encode`] for as many draws as needed
    ///
    /// # Errors
    /// Fails if the stage declares no slot, or the texture cannot be read as a single-sampled
    /// 2D four-component float image.
    pub fn bind_source(&self, device: &wgpu::Device, source: &wgpu::Texture) -> Result<SourceBinding> {
        let layout = self.source_layout.as_ref().ok_or(CompositorError::NoSourceSlot)?;
        validate_source(source)?;

        let view = source.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.descriptor.label()),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: SOURCE_BINDING,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        tracing::debug!(width = source.width(), height = source.height(), format = ?source.format(), "Bound source image");

        Ok(SourceBinding {
            bind_group,
            size: (source.width(), source.height()),
        })
    }

    /// Records the full-screen draw into `encoder`
    ///
    /// # Arguments
    /// * `encoder` - Encoder the render pass is recorded into
    /// * `target` - Color attachment; every pixel is overwritten
    /// * `source` - Binding from [`FullscreenCompositor::bind_source`], `None` for the debug gradient
    ///
    /// # Errors
    /// Fails if the target is not a render attachment of the declared output format, or if a
    /// pass-through stage is given no source binding.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::Texture, source: Option<&SourceBinding>) -> Result<()> {
        if !target.usage().contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(CompositorError::TargetNotRenderable { usage: target.usage() });
        }
        if target.format() != self.descriptor.output_format() {
            return Err(CompositorError::FormatMismatch {
                pipeline: self.descriptor.output_format(),
                target: target.format(),
            });
        }
        let source = match (self.source_layout.is_some(), source) {
            (true, None) => return Err(CompositorError::MissingSourceImage),
            (true, Some(source)) => Some(source),
            (false, Some(_)) => return Err(CompositorError::NoSourceSlot),
            (false, None) => None,
        };

        if let Some(source) = source {
            if source.size != (target.width(), target.height()) {
                tracing::trace!(
                    source = ?source.size,
                    target = ?(target.width(), target.height()),
                    edge_policy = self.descriptor.edge_policy().name(),
                    "Source and target dimensions differ"
                );
            }
        }

        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.descriptor.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });

        render_pass.set_pipeline(&self.pipeline);
        if let Some(source) = source {
            render_pass.set_bind_group(SOURCE_GROUP, &source.bind_group, &[]);
        }
        render_pass.draw(0..VERTEX_COUNT, 0..INSTANCE_COUNT);

        Ok(())
    }

    /// Encodes the draw into a fresh command buffer and submits it
    pub fn render(&self, device: &wgpu::Device, queue: &wgpu::Queue, target: &wgpu::Texture, source: Option<&SourceBinding>) -> Result<()> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(self.descriptor.label()),
        });
        self.encode(&mut encoder, target, source)?;
        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

/// Checks that a texture can be read by the pass-through fragment stage
pub fn validate_source(source: &wgpu::Texture) -> Result<()> {
    if !source.usage().contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        return Err(CompositorError::SourceNotSampleable { usage: source.usage() });
    }
    if source.dimension() != wgpu::TextureDimension::D2 {
        return Err(CompositorError::SourceDimension { dimension: source.dimension() });
    }
    if source.sample_count() != 1 {
        return Err(CompositorError::SourceMultisampled {
            sample_count: source.sample_count(),
        });
    }
    validate_source_format(source.format())
}

/// Checks that a format is sampled as four float components
pub fn validate_source_format(format: wgpu::TextureFormat) -> Result<()> {
    let float_sampled = matches!(format.sample_type(None, None), Some(wgpu::TextureSampleType::Float { .. }));
    if !float_sampled || format.components() != 4 {
        return Err(CompositorError::SourceFormat { format });
    }
    Ok(())
}
