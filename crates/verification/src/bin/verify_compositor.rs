//! Compositor verification binary
//!
//! Renders an input image through every compositor configuration on the GPU and compares
//! each result with the CPU reference engine. Exits with status 1 if any configuration differs.

use clap::Parser;
use fullscreen_compositor::{
    CompositorDescriptor, EdgePolicy, FragmentMode, FullscreenCompositor, GpuContext,
    texture::{TEXTURE_USAGE_TARGET, create_texture, load_image_as_texture, save_texture_as_image},
};
use fullscreen_compositor_verification::{
    ReferenceEngine,
    compare::{CompareResult, compare_images},
};
use std::{path::PathBuf, time::Instant};
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about = "Compare GPU compositor output with the CPU reference engine")]
struct Args {
    /// Input image file path
    input: PathBuf,

    /// Render target width (defaults to the input width)
    #[arg(long)]
    width: Option<u32>,

    /// Render target height (defaults to the input height)
    #[arg(long)]
    height: Option<u32>,
}

/// Every configuration the reference engine can reproduce, rendered into `float_format` and `Rgba8Unorm`
fn configurations(float_format: wgpu::TextureFormat) -> Vec<CompositorDescriptor> {
    let mut configurations = Vec::new();
    for format in [float_format, wgpu::TextureFormat::Rgba8Unorm] {
        configurations.push(CompositorDescriptor::debug_gradient(format));
        for edge in [EdgePolicy::Clamp, EdgePolicy::Repeat, EdgePolicy::Transparent] {
            configurations.push(CompositorDescriptor::passthrough(format).with_edge_policy(edge));
        }
    }
    configurations
}

fn describe(descriptor: &CompositorDescriptor) -> String {
    match descriptor.mode() {
        FragmentMode::DebugGradient => format!("{} ({:?})", descriptor.mode().name(), descriptor.output_format()),
        FragmentMode::Passthrough => format!("{}/{} ({:?})", descriptor.mode().name(), descriptor.edge_policy().name(), descriptor.output_format()),
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
        .add_directive("wgpu_core::device::resource=warn".parse()?);
    tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer()).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let args = Args::parse();

    let input_image = image::open(&args.input).map_err(|e| format!("Failed to open input image: {e}"))?.to_rgba32f();
    let (input_width, input_height) = input_image.dimensions();
    let width = args.width.unwrap_or(input_width);
    let height = args.height.unwrap_or(input_height);

    let context = GpuContext::new_headless().await?;
    let device = &context.device;
    let queue = &context.queue;
    let source_texture = load_image_as_texture(device, queue, &input_image);
    let float_format = context.float_render_format()?;
    tracing::info!("Verifying {width}x{height} targets on {} with {float_format:?}", context.adapter_info.name);

    let mut failures = 0;
    for descriptor in configurations(float_format) {
        let name = describe(&descriptor);

        let reference_start = Instant::now();
        let reference = ReferenceEngine::new(descriptor.clone())?.render(Some(&input_image), width, height)?;
        let reference_duration = reference_start.elapsed();

        let gpu_start = Instant::now();
        let compositor = FullscreenCompositor::new(device, descriptor)?;
        let binding = if compositor.descriptor().mode().reads_source() {
            Some(compositor.bind_source(device, &source_texture)?)
        } else {
            None
        };
        let target = create_texture(device, "Verification Target", width, height, compositor.descriptor().output_format(), TEXTURE_USAGE_TARGET);
        compositor.render(device, queue, &target, binding.as_ref())?;
        let gpu_output = save_texture_as_image(device, queue, &target)?;
        let gpu_duration = gpu_start.elapsed();

        match compare_images(&reference, &gpu_output) {
            CompareResult::Match => {
                println!("✓ Outputs match for {name} (reference: {reference_duration:.2?}, GPU: {gpu_duration:.2?})");
            }
            CompareResult::DimensionMismatch {
                reference_dimensions,
                gpu_dimensions,
            } => {
                failures += 1;
                eprintln!("✗ Dimension mismatch for {name}: reference {reference_dimensions:?}, GPU {gpu_dimensions:?}");
            }
            CompareResult::PixelMismatch {
                mismatched_pixels,
                first_mismatch,
                max_difference,
                channels_matched,
            } => {
                failures += 1;
                eprintln!(
                    "✗ Pixel mismatch for {name}: {mismatched_pixels} pixels differ, first at {first_mismatch:?}, max difference {max_difference}, channels matched {channels_matched:?}"
                );
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} configuration(s) failed verification");
        std::process::exit(1);
    }

    Ok(())
}
