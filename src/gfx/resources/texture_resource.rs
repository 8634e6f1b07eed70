//! Texture resource management for wgpu
//!
//! Depth buffers, textures decoded from image files, and the 1×1 fallback
//! bound when a material has no texture.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{Result, VistaError};

/// GPU texture resource containing texture, view, and sampler
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Decodes an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<image::RgbaImage> {
    let image = image::open(path).map_err(|source| VistaError::TextureLoad {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Loaded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image.to_rgba8())
}

/// Scales `image` down, keeping its aspect ratio, until neither side
/// exceeds `max_dimension`.
pub fn fit_to_limit(image: &image::RgbaImage, max_dimension: u32) -> Cow<'_, image::RgbaImage> {
    let (width, height) = image.dimensions();
    let largest = width.max(height);
    if largest <= max_dimension || max_dimension == 0 {
        return Cow::Borrowed(image);
    }
    let scale = max_dimension as f64 / largest as f64;
    let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
    log::warn!(
        "Texture {}x{} exceeds the device limit {}, scaling to {}x{}",
        width,
        height,
        max_dimension,
        new_width,
        new_height
    );
    Cow::Owned(image::imageops::resize(
        image,
        new_width,
        new_height,
        image::imageops::FilterType::Triangle,
    ))
}

impl TextureResource {
    /// Standard depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth texture matching the surface configuration
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads raw sRGB RGBA8 pixel data (4 bytes per pixel).
    pub fn create_from_rgba_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        (width, height): (u32, u32),
        label: &str,
        address_mode: wgpu::AddressMode,
    ) -> Self {
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
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
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
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads `image`, downscaled first if it is larger than the device
    /// allows.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::RgbaImage,
        label: &str,
        address_mode: wgpu::AddressMode,
    ) -> Self {
        let image = fit_to_limit(image, device.limits().max_texture_dimension_2d);
        Self::create_from_rgba_data(
            device,
            queue,
            image.as_raw(),
            image.dimensions(),
            label,
            address_mode,
        )
    }

    /// 1×1 texture of a single colour.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        Self::create_from_rgba_data(
            device,
            queue,
            &rgba,
            (1, 1),
            label,
            wgpu::AddressMode::Repeat,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_texture_error() {
        let err = load_image(Path::new("definitely/not/here.jpg")).unwrap_err();
        match err {
            VistaError::TextureLoad { path, .. } => {
                assert_eq!(path, Path::new("definitely/not/here.jpg"))
            }
            other => panic!("expected TextureLoad, got {other:?}"),
        }
    }

    #[test]
    fn wide_panorama_is_scaled_to_limit() {
        let panorama = image::RgbaImage::new(10000, 5000);
        let fitted = fit_to_limit(&panorama, 8192);
        assert_eq!(fitted.dimensions(), (8192, 4096));
        assert!(matches!(fitted, Cow::Owned(_)));
    }

    #[test]
    fn small_texture_is_left_alone() {
        let grass = image::RgbaImage::new(512, 256);
        let fitted = fit_to_limit(&grass, 8192);
        assert_eq!(fitted.dimensions(), (512, 256));
        assert!(matches!(fitted, Cow::Borrowed(_)));

        let tall = image::RgbaImage::new(3, 9000);
        assert_eq!(fit_to_limit(&tall, 8192).dimensions(), (3, 8192));
    }
}
