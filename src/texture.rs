//! Albedo textures sampled by the geometry and forward passes.
//!
//! This is the texture-loader boundary: files are decoded with `image` and
//! uploaded once. Render-target attachments are separate; see
//! [`render_target`](crate::render_target).

use crate::gpu::GpuContext;

/// A sampled 2D RGBA texture with its own sampler.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Uploads tightly packed sRGB RGBA8 pixels.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::debug!("uploaded texture '{}' ({}x{})", label, width, height);

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    pub fn from_file(gpu: &GpuContext, path: &str) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, path))
    }

    pub fn from_bytes(
        gpu: &GpuContext,
        bytes: &[u8],
        label: &str,
    ) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, label))
    }

    /// 1x1 white, bound when a draw has no albedo texture.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_rgba(gpu, &[255, 255, 255, 255], 1, 1, "White Texture")
    }

    /// Procedural stone-like checkerboard, used when no texture file is given.
    pub fn checker(gpu: &GpuContext, size: u32, cells: u32, seed: u32) -> Self {
        let data = checker_pixels(size, cells, seed);
        Self::from_rgba(gpu, &data, size, size, "Checker Texture")
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// RGBA8 pixels of a `size`x`size` checkerboard with `cells` squares per
/// side and a little per-pixel grain.
pub fn checker_pixels(size: u32, cells: u32, seed: u32) -> Vec<u8> {
    let cell = (size / cells.max(1)).max(1);
    let mut data = vec![0u8; (size * size * 4) as usize];

    for y in 0..size {
        for x in 0..size {
            let idx = ((y * size + x) * 4) as usize;
            let base: i32 = if (x / cell + y / cell) % 2 == 0 { 170 } else { 110 };
            let grain = (hash(x, y, seed) % 24) as i32 - 12;
            let value = (base + grain).clamp(0, 255) as u8;

            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value.saturating_sub(8);
            data[idx + 3] = 255;
        }
    }
    data
}

fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_alternates_cells() {
        let size = 64;
        let data = checker_pixels(size, 8, 7);
        assert_eq!(data.len(), (size * size * 4) as usize);

        let red = |x: u32, y: u32| data[((y * size + x) * 4) as usize];
        // neighbouring cells differ by far more than the grain
        assert!(red(4, 4) > red(12, 4) + 20);
        assert!(data.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn checker_is_deterministic() {
        assert_eq!(checker_pixels(16, 4, 3), checker_pixels(16, 4, 3));
    }
}
