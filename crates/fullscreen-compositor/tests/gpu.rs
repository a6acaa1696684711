//! GPU tests for the compositor stage
//!
//! Each test requests a headless adapter and returns early when the machine has none.
//! Float targets use the first float format the device can render to, so expected values
//! are converted through that format before comparing.

use fullscreen_compositor::{
    CompositorDescriptor, CompositorError, EdgePolicy, FullscreenCompositor, GpuContext, fragment,
    texture::{TEXTURE_USAGE_SOURCE, TEXTURE_USAGE_TARGET, create_texture, load_image_as_texture, save_texture_as_image},
};

fn gpu_context() -> Option<GpuContext> {
    match GpuContext::new_headless_blocking() {
        Ok(context) => Some(context),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

/// Context plus the float format its render targets use
fn gpu_context_with_float_format() -> Option<(GpuContext, wgpu::TextureFormat)> {
    let context = gpu_context()?;
    match context.float_render_format() {
        Ok(format) => Some((context, format)),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

/// Value a color reads back as after being stored in `format`
fn stored(format: wgpu::TextureFormat, color: [f32; 4]) -> [f32; 4] {
    match format {
        wgpu::TextureFormat::Rgba16Float => color.map(|c| half::f16::from_f32(c).to_f32()),
        wgpu::TextureFormat::Rgba8Unorm => color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() / 255.0),
        _ => color,
    }
}

fn render_passthrough(
    context: &GpuContext,
    format: wgpu::TextureFormat,
    source: &image::Rgba32FImage,
    edge_policy: EdgePolicy,
    target_size: (u32, u32),
) -> image::Rgba32FImage {
    let descriptor = CompositorDescriptor::passthrough(format).with_edge_policy(edge_policy);
    let compositor = FullscreenCompositor::new(&context.device, descriptor).unwrap();

    let source_texture = load_image_as_texture(&context.device, &context.queue, source);
    let binding = compositor.bind_source(&context.device, &source_texture).unwrap();

    let target = create_texture(&context.device, "Target", target_size.0, target_size.1, format, TEXTURE_USAGE_TARGET);
    compositor.render(&context.device, &context.queue, &target, Some(&binding)).unwrap();

    save_texture_as_image(&context.device, &context.queue, &target).unwrap()
}

fn two_by_two_source() -> image::Rgba32FImage {
    let texels = [[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0]];
    image::Rgba32FImage::from_raw(2, 2, texels.concat()).unwrap()
}

/// Distinct texels whose values survive a round trip through any float target
fn gradient_source(width: u32, height: u32) -> image::Rgba32FImage {
    image::Rgba32FImage::from_fn(width, height, |x, y| image::Rgba([x as f32 * 0.25, y as f32 * 0.5, 0.25, 1.0]))
}

#[test]
fn test_two_by_two_passthrough_is_exact() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let source = two_by_two_source();

    let output = render_passthrough(&context, format, &source, EdgePolicy::Clamp, (2, 2));

    assert_eq!(output.dimensions(), (2, 2));
    assert_eq!(output.as_raw(), source.as_raw());
}

#[test]
fn test_passthrough_identity_on_larger_image() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let source = gradient_source(37, 19);

    let output = render_passthrough(&context, format, &source, EdgePolicy::Clamp, (37, 19));

    for (x, y, pixel) in output.enumerate_pixels() {
        assert_eq!(pixel.0, stored(format, source.get_pixel(x, y).0), "pixel ({x}, {y})");
    }
}

#[test]
fn test_rendering_is_idempotent() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let source = gradient_source(16, 16);

    let first = render_passthrough(&context, format, &source, EdgePolicy::Repeat, (24, 20));
    let second = render_passthrough(&context, format, &source, EdgePolicy::Repeat, (24, 20));

    let first_bytes: &[u8] = bytemuck::cast_slice(first.as_raw().as_slice());
    let second_bytes: &[u8] = bytemuck::cast_slice(second.as_raw().as_slice());
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn test_edge_policies_on_larger_target() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let source = gradient_source(4, 3);

    for edge_policy in [EdgePolicy::Clamp, EdgePolicy::Repeat, EdgePolicy::Transparent] {
        let output = render_passthrough(&context, format, &source, edge_policy, (9, 7));
        for (x, y, pixel) in output.enumerate_pixels() {
            let expected = stored(format, fragment::passthrough(&source, fragment::pixel_center(x, y), edge_policy));
            assert_eq!(pixel.0, expected, "{edge_policy:?} pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_debug_gradient_writes_window_coordinates() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let compositor = FullscreenCompositor::new(&context.device, CompositorDescriptor::debug_gradient(format)).unwrap();

    let target = create_texture(&context.device, "Target", 5, 3, format, TEXTURE_USAGE_TARGET);
    compositor.render(&context.device, &context.queue, &target, None).unwrap();
    let output = save_texture_as_image(&context.device, &context.queue, &target).unwrap();

    for (x, y, pixel) in output.enumerate_pixels() {
        let expected = stored(format, fragment::debug_gradient(fragment::pixel_center(x, y)));
        assert_eq!(pixel.0, expected, "pixel ({x}, {y})");
    }
}

#[test]
fn test_configuration_errors() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let device = &context.device;
    let compositor = FullscreenCompositor::new(device, CompositorDescriptor::passthrough(format)).unwrap();
    let target = create_texture(device, "Target", 4, 4, format, TEXTURE_USAGE_TARGET);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

    // No source image bound
    assert!(matches!(compositor.encode(&mut encoder, &target, None), Err(CompositorError::MissingSourceImage)));

    // Source cannot be sampled
    let storage_only = create_texture(device, "Storage Only", 4, 4, wgpu::TextureFormat::Rgba32Float, wgpu::TextureUsages::COPY_DST);
    assert!(matches!(compositor.bind_source(device, &storage_only), Err(CompositorError::SourceNotSampleable { .. })));

    // Source is not a four-component float image
    let integer_source = create_texture(device, "Integer Source", 4, 4, wgpu::TextureFormat::Rgba32Uint, TEXTURE_USAGE_SOURCE);
    assert!(matches!(compositor.bind_source(device, &integer_source), Err(CompositorError::SourceFormat { .. })));

    // Target format differs from the declared output format
    let source = create_texture(device, "Source", 4, 4, wgpu::TextureFormat::Rgba32Float, TEXTURE_USAGE_SOURCE);
    let binding = compositor.bind_source(device, &source).unwrap();
    let srgb_target = create_texture(device, "sRGB Target", 4, 4, wgpu::TextureFormat::Rgba8UnormSrgb, TEXTURE_USAGE_TARGET);
    assert!(matches!(
        compositor.encode(&mut encoder, &srgb_target, Some(&binding)),
        Err(CompositorError::FormatMismatch {
            pipeline,
            target: wgpu::TextureFormat::Rgba8UnormSrgb,
        }) if pipeline == format
    ));

    // Target is not a render attachment
    let copy_target = create_texture(device, "Copy Target", 4, 4, format, wgpu::TextureUsages::COPY_SRC);
    assert!(matches!(compositor.encode(&mut encoder, &copy_target, Some(&binding)), Err(CompositorError::TargetNotRenderable { .. })));

    // Debug stage has no slot to bind
    let debug = FullscreenCompositor::new(device, CompositorDescriptor::debug_gradient(format)).unwrap();
    assert!(matches!(debug.bind_source(device, &source), Err(CompositorError::NoSourceSlot)));
    assert!(matches!(debug.encode(&mut encoder, &target, Some(&binding)), Err(CompositorError::NoSourceSlot)));

    // Nothing was recorded into the encoder, so it can be finished cleanly
    context.queue.submit(std::iter::once(encoder.finish()));
}

#[test]
fn test_source_must_be_single_sampled_2d() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };
    let device = &context.device;
    let compositor = FullscreenCompositor::new(device, CompositorDescriptor::passthrough(format)).unwrap();

    let volume = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Volume Source"),
        size: wgpu::Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: 2,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: TEXTURE_USAGE_SOURCE,
        view_formats: &[],
    });
    assert!(matches!(
        compositor.bind_source(device, &volume),
        Err(CompositorError::SourceDimension {
            dimension: wgpu::TextureDimension::D3
        })
    ));

    let msaa_format = wgpu::TextureFormat::Rgba8Unorm;
    if !context.format_features(msaa_format).flags.sample_count_supported(4) {
        eprintln!("skipping multisampled source check: {msaa_format:?} does not support 4x MSAA");
        return;
    }
    let multisampled = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Multisampled Source"),
        size: wgpu::Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 4,
        dimension: wgpu::TextureDimension::D2,
        format: msaa_format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    assert!(matches!(
        compositor.bind_source(device, &multisampled),
        Err(CompositorError::SourceMultisampled { sample_count: 4 })
    ));
}

#[test]
fn test_unrenderable_output_format_is_an_error() {
    let Some(context) = gpu_context() else { return };

    // Float-sampled color formats that are commonly sample-only
    let candidates = [
        wgpu::TextureFormat::Rgb9e5Ufloat,
        wgpu::TextureFormat::Rgba8Snorm,
        wgpu::TextureFormat::Rgba16Snorm,
        wgpu::TextureFormat::Rgba32Float,
    ];
    let Some(format) = candidates.into_iter().find(|&format| context.check_render_target(format).is_err()) else {
        eprintln!("skipping: every candidate format is renderable on this device");
        return;
    };

    let result = FullscreenCompositor::new(&context.device, CompositorDescriptor::passthrough(format));
    assert!(
        matches!(result, Err(CompositorError::OutputFormatNotRenderable { format: f, .. }) if f == format),
        "{format:?} should be rejected"
    );
}

#[test]
fn test_float_render_format_is_renderable() {
    let Some((context, format)) = gpu_context_with_float_format() else { return };

    assert!(context.check_render_target(format).is_ok());
    assert!(FullscreenCompositor::new(&context.device, CompositorDescriptor::debug_gradient(format)).is_ok());
}

#[test]
fn test_eight_bit_target() {
    let Some(context) = gpu_context() else { return };
    let descriptor = CompositorDescriptor::passthrough(wgpu::TextureFormat::Rgba8Unorm);
    let compositor = FullscreenCompositor::new(&context.device, descriptor).unwrap();

    let source = two_by_two_source();
    let source_texture = load_image_as_texture(&context.device, &context.queue, &source);
    let binding = compositor.bind_source(&context.device, &source_texture).unwrap();
    let target = create_texture(&context.device, "Target", 2, 2, wgpu::TextureFormat::Rgba8Unorm, TEXTURE_USAGE_TARGET);
    compositor.render(&context.device, &context.queue, &target, Some(&binding)).unwrap();

    // 0.0 and 1.0 are exactly representable in 8-bit unorm
    let output = save_texture_as_image(&context.device, &context.queue, &target).unwrap();
    assert_eq!(output.as_raw(), source.as_raw());
}
