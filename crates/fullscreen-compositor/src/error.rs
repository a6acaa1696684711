//! Error types for the compositor stage
//!
//! Configuration errors are detected while building the pipeline, binding the source image,
//! or recording the draw. The shader stages themselves have no runtime failure modes.

/// Errors produced by the compositor stage and its GPU helpers
#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    /// A pass-through draw was recorded without a bound source image
    #[error("pass-through compositing requires a bound source image")]
    MissingSourceImage,

    /// The stage runs in debug-gradient mode and declares no binding slot
    #[error("the debug gradient stage has no source binding slot")]
    NoSourceSlot,

    /// The source texture cannot be bound for read-only sampling
    #[error("source texture usage {usage:?} does not include TEXTURE_BINDING")]
    SourceNotSampleable {
        /// Usage flags the texture was created with
        usage: wgpu::TextureUsages,
    },

    /// The source texture is not two-dimensional
    #[error("source texture must be 2D, got {dimension:?}")]
    SourceDimension {
        /// Dimension of the offending texture
        dimension: wgpu::TextureDimension,
    },

    /// The source texture is multisampled
    #[error("source texture must be single-sampled, got {sample_count} samples")]
    SourceMultisampled {
        /// Sample count of the offending texture
        sample_count: u32,
    },

    /// The source texture is not a four-component float-sampled format
    #[error("source texture format {format:?} is not a 4-component float format")]
    SourceFormat {
        /// Format of the offending texture
        format: wgpu::TextureFormat,
    },

    /// The render target format differs from the pipeline's declared output format
    #[error("render target format {target:?} does not match pipeline output format {pipeline:?}")]
    FormatMismatch {
        /// Output format declared by the descriptor
        pipeline: wgpu::TextureFormat,
        /// Format of the render target
        target: wgpu::TextureFormat,
    },

    /// The render target cannot be used as a color attachment
    #[error("render target usage {usage:?} does not include RENDER_ATTACHMENT")]
    TargetNotRenderable {
        /// Usage flags the target was created with
        usage: wgpu::TextureUsages,
    },

    /// The descriptor declares a depth or stencil output format
    #[error("output format {format:?} is not a color format")]
    OutputFormatNotColor {
        /// Declared output format
        format: wgpu::TextureFormat,
    },

    /// The descriptor declares a format the fragment stage's `vec4<f32>` output cannot be written to
    #[error("output format {format:?} is not a float-sampled color format")]
    OutputFormatNotFloat {
        /// Declared output format
        format: wgpu::TextureFormat,
    },

    /// The descriptor declares a block-compressed output format
    #[error("output format {format:?} is block-compressed")]
    OutputFormatCompressed {
        /// Declared output format
        format: wgpu::TextureFormat,
    },

    /// The device cannot use the output format as a color attachment
    #[error("output format {format:?} is not renderable on this device: {reason}")]
    OutputFormatNotRenderable {
        /// Declared output format
        format: wgpu::TextureFormat,
        /// What rejected the format
        reason: String,
    },

    /// None of the float formats tried can be rendered to
    #[error("no float color format is renderable on this device (tried {tried:?})")]
    NoRenderableFloatFormat { tried: Vec<wgpu::TextureFormat> },

    #[error("failed to request a GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request a GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("failed to poll the GPU device: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("failed to map readback buffer: {0}")]
    BufferAsync(#[from] wgpu::BufferAsyncError),

    #[error("readback channel closed before the buffer was mapped")]
    MapChannelClosed,

    /// Texture readback only understands a handful of color formats
    #[error("unsupported texture format for readback: {format:?}")]
    UnsupportedReadbackFormat {
        /// Format of the texture being read
        format: wgpu::TextureFormat,
    },

    #[error("pixel buffer does not match image dimensions {width}x{height}")]
    ImageSize { width: u32, height: u32 },

    #[error("failed to parse compositor manifest: {0}")]
    Manifest(#[from] serde_norway::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CompositorError> = std::result::Result<T, E>;
