//! PNG texture loading and upload

use std::path::Path;

use crate::core::error::Error;

/// A sampled 2D texture with its view
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Load an image from disk and upload it as RGBA8. Missing or
    /// malformed files are a hard error.
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        srgb: bool,
    ) -> Result<Self, Error> {
        let img = image::open(path)
            .map_err(|e| Error::Asset(format!("failed to load {}: {e}", path.display())))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_pixels(
            device,
            queue,
            &path.display().to_string(),
            width,
            height,
            &img,
            srgb,
        ))
    }

    /// Upload raw RGBA8 pixels
    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        srgb: bool,
    ) -> Self {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// A 1x1 "straight up" normal map, for when no normal texture is wanted
    pub fn flat_normal(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_pixels(device, queue, "flat_normal", 1, 1, &[128, 128, 255, 255], false)
    }

    /// A 1x1 solid color texture (linear RGBA bytes)
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4]) -> Self {
        Self::from_pixels(device, queue, "solid_color", 1, 1, &rgba, true)
    }
}
