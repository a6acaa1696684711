//! Full-screen compositor CLI
//!
//! Renders an image file through the compositor stage on a headless GPU and writes the
//! render target back to disk.
//!
//! # Usage
//! ```bash
//! fullscreen-compositor input.png output.png --edge repeat --width 1920 --height 1080
//! ```

use clap::Parser;
use fullscreen_compositor::{
    CompositorManifest, EdgePolicy, FragmentMode, FullscreenCompositor, GpuContext,
    texture::{TEXTURE_USAGE_TARGET, create_texture, load_image_file_as_texture, save_texture_as_image_file},
};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for the compositor
#[derive(Parser)]
#[command(version, about = "Composite an image onto a render target with a full-screen triangle")]
struct Args {
    /// Input image file path
    input: PathBuf,

    /// Output image file path
    output: PathBuf,

    /// Fragment mode (passthrough, debug-gradient); overrides the manifest
    #[arg(long, short)]
    mode: Option<String>,

    /// Edge policy for out-of-bounds texels (clamp, repeat, transparent); overrides the manifest
    #[arg(long, short)]
    edge: Option<String>,

    /// Render target width (defaults to the input width)
    #[arg(long)]
    width: Option<u32>,

    /// Render target height (defaults to the input height)
    #[arg(long)]
    height: Option<u32>,

    /// YAML manifest describing the stage
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn parse_mode(value: &str) -> Option<FragmentMode> {
    match value.to_lowercase().as_str() {
        "passthrough" => Some(FragmentMode::Passthrough),
        "debug-gradient" | "debug_gradient" | "debug" => Some(FragmentMode::DebugGradient),
        _ => None,
    }
}

fn parse_edge(value: &str) -> Option<EdgePolicy> {
    match value.to_lowercase().as_str() {
        "clamp" => Some(EdgePolicy::Clamp),
        "repeat" => Some(EdgePolicy::Repeat),
        "transparent" => Some(EdgePolicy::Transparent),
        _ => None,
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let args = Args::parse();

    let mut manifest = match &args.manifest {
        Some(path) => CompositorManifest::from_file(path)?,
        None => CompositorManifest::default(),
    };
    if let Some(mode) = &args.mode {
        manifest.mode = parse_mode(mode).ok_or_else(|| format!("Invalid mode '{mode}'. Valid modes: passthrough, debug-gradient"))?;
    }
    if let Some(edge) = &args.edge {
        manifest.edge = parse_edge(edge).ok_or_else(|| format!("Invalid edge policy '{edge}'. Valid policies: clamp, repeat, transparent"))?;
    }

    let context = GpuContext::new_headless_blocking()?;
    let device = &context.device;
    let queue = &context.queue;

    // A format named in a manifest is honored as given; the built-in default may be swapped
    // for a float format the device can render to
    if args.manifest.is_none() && context.check_render_target(manifest.output_format).is_err() {
        let fallback = context.float_render_format()?;
        tracing::warn!("{:?} is not renderable on this device, using {fallback:?}", manifest.output_format);
        manifest.output_format = fallback;
    }
    let descriptor = manifest.to_descriptor();

    tracing::info!("Loading image from: {}", args.input.display());
    let input_texture = load_image_file_as_texture(device, queue, &args.input)?;
    let (input_width, input_height) = (input_texture.width(), input_texture.height());
    let target_width = args.width.unwrap_or(input_width);
    let target_height = args.height.unwrap_or(input_height);
    tracing::info!("Input image: {input_width}x{input_height}, target: {target_width}x{target_height}");

    let compositor = FullscreenCompositor::new(device, descriptor)?;
    let source = if compositor.descriptor().mode().reads_source() {
        Some(compositor.bind_source(device, &input_texture)?)
    } else {
        None
    };

    let target = create_texture(
        device,
        "Render Target",
        target_width,
        target_height,
        compositor.descriptor().output_format(),
        TEXTURE_USAGE_TARGET,
    );

    tracing::info!(
        "Compositing with mode '{}' and edge policy '{}'",
        compositor.descriptor().mode().name(),
        compositor.descriptor().edge_policy().name()
    );
    compositor.render(device, queue, &target, source.as_ref())?;

    tracing::info!("Saving result to: {}", args.output.display());
    save_texture_as_image_file(device, queue, &target, &args.output)?;

    Ok(())
}
