use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::loader::LoadedImage;

/// Side length of the neutral fallback texture bound before any real
/// pair has loaded (and after a failed decode). Mid-gray everywhere:
/// 0.5 depth, 0.5 color, so the cloud renders as a flat dim plane.
const FALLBACK_SIZE: u32 = 4;

pub(crate) struct PairTextures {
    pub _color: wgpu::Texture,
    pub _depth: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &LoadedImage,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &image.pixels,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

impl PairTextures {
    pub(crate) fn from_images(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: &LoadedImage,
        depth: &LoadedImage,
        label: &str,
    ) -> Self {
        let (color_tex, color_view) = upload(device, queue, color, &format!("{label} color"));
        let (depth_tex, depth_view) = upload(device, queue, depth, &format!("{label} depth"));
        Self {
            _color: color_tex,
            _depth: depth_tex,
            color_view,
            depth_view,
        }
    }

    pub(crate) fn fallback(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let image = fallback_image();
        Self::from_images(device, queue, &image, &image, "fallback pair")
    }
}

pub(crate) fn fallback_image() -> LoadedImage {
    let mut pixels = Vec::with_capacity((FALLBACK_SIZE * FALLBACK_SIZE * 4) as usize);
    for _ in 0..FALLBACK_SIZE * FALLBACK_SIZE {
        pixels.extend([128u8, 128, 128, 255]);
    }
    LoadedImage {
        width: FALLBACK_SIZE,
        height: FALLBACK_SIZE,
        pixels,
    }
}

pub(crate) fn linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_uniform_mid_gray() {
        let image = fallback_image();
        assert_eq!(image.pixels.len(), (image.width * image.height * 4) as usize);
        for pixel in image.pixels.chunks_exact(4) {
            assert_eq!(pixel, [128, 128, 128, 255]);
        }
    }
}
