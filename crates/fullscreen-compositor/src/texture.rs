//! Texture upload and readback helpers
//!
//! Moves RGBA32F images between host memory and wgpu textures for the CLI, the verification
//! tooling and the GPU tests.

use crate::error::{CompositorError, Result};

/// Usage flags for source images: sampled by the compositor, filled from the host
pub const TEXTURE_USAGE_SOURCE: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
    .union(wgpu::TextureUsages::COPY_DST)
    .union(wgpu::TextureUsages::COPY_SRC);

/// Usage flags for render targets that are read back to the host
pub const TEXTURE_USAGE_TARGET: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::COPY_SRC);

/// Creates a single-sampled 2D texture without mipmaps
pub fn create_texture(device: &wgpu::Device, label: &str, width: u32, height: u32, format: wgpu::TextureFormat, usage: wgpu::TextureUsages) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

/// Uploads an RGBA32F image into a new `Rgba32Float` source texture
pub fn load_image_as_texture(device: &wgpu::Device, queue: &wgpu::Queue, image: &image::Rgba32FImage) -> wgpu::Texture {
    let (width, height) = image.dimensions();
    let texture = create_texture(device, "Source Image", width, height, wgpu::TextureFormat::Rgba32Float, TEXTURE_USAGE_SOURCE);

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(image.as_raw().as_slice()),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4 * 4), // 4 components * 4 bytes per f32
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    texture
}

/// Loads an image file into a new `Rgba32Float` source texture
pub fn load_image_file_as_texture(device: &wgpu::Device, queue: &wgpu::Queue, path: &std::path::Path) -> Result<wgpu::Texture> {
    let image = image::open(path)?.to_rgba32f();
    Ok(load_image_as_texture(device, queue, &image))
}

/// Reads a texture back into an RGBA32F image
///
/// # Arguments
/// * `device` - Device that owns `texture`
/// * `queue` - Queue used to submit the copy
/// * `texture` - Texture with `COPY_SRC` usage
///
/// # Returns
/// The texture contents. `Rgba32Float` is returned bit-exact and `Rgba16Float` is widened
/// exactly. 8-bit formats are scaled to [0, 1] without any color space conversion.
pub fn save_texture_as_image(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Result<image::Rgba32FImage> {
    let wgpu::Extent3d { width, height, .. } = texture.size();
    let format = texture.format();

    let bytes_per_pixel = match format {
        wgpu::TextureFormat::Rgba32Float => 16,
        wgpu::TextureFormat::Rgba16Float => 8,
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => 4,
        _ => return Err(CompositorError::UnsupportedReadbackFormat { format }),
    };

    // Buffer copies need rows aligned to COPY_BYTES_PER_ROW_ALIGNMENT
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: padded_bytes_per_row as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Readback Encoder") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
        // The receiver only disappears if the caller already gave up
        let _ = sender.send(v);
    });

    device.poll(wgpu::PollType::Wait)?;
    pollster::block_on(receiver.receive()).ok_or(CompositorError::MapChannelClosed)??;

    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    {
        let data = buffer_slice.get_mapped_range();
        for row in data.chunks_exact(padded_bytes_per_row as usize) {
            let row = &row[..unpadded_bytes_per_row as usize];
            match format {
                wgpu::TextureFormat::Rgba32Float => {
                    pixels.extend(row.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])));
                }
                wgpu::TextureFormat::Rgba16Float => {
                    pixels.extend(row.chunks_exact(2).map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32()));
                }
                _ => pixels.extend(row.iter().map(|&b| b as f32 / 255.0)),
            }
        }
    }
    buffer.unmap();

    image::Rgba32FImage::from_raw(width, height, pixels).ok_or(CompositorError::ImageSize { width, height })
}

/// Reads a texture back and writes it to an 8-bit RGBA image file
pub fn save_texture_as_image_file(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture, path: &std::path::Path) -> Result<()> {
    let image = save_texture_as_image(device, queue, texture)?;
    image::DynamicImage::ImageRgba32F(image).to_rgba8().save(path)?;
    Ok(())
}
