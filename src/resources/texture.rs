use std::path::Path;

use crate::{
    data_structures::texture::{TextureError, TextureImage, TextureKind},
    resources::load_binary,
};

/// Texture slots the default fragment shader samples, in binding order.
/// Slot `i` occupies binding `2 * i` (texture) and `2 * i + 1` (sampler).
pub const SHADER_TEXTURE_SLOTS: [(&str, TextureKind); 2] = [
    ("diffuse0", TextureKind::Diffuse),
    ("specular0", TextureKind::Specular),
];

pub fn diffuse_specular_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entries: Vec<wgpu::BindGroupLayoutEntry> = (0..SHADER_TEXTURE_SLOTS.len() as u32)
        .flat_map(|slot| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: slot * 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slot * 2 + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect();
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("Model texture_bind_group_layout"),
    })
}

/// Convert an image decoded by the glTF importer. 16-bit and float images are
/// narrowed to 8 bits per channel, keeping their channel count.
pub fn image_from_gltf(data: gltf::image::Data) -> Result<TextureImage, TextureError> {
    use gltf::image::Format;

    let (channels, pixels) = match data.format {
        Format::R8 => (1, data.pixels),
        Format::R8G8 => (2, data.pixels),
        Format::R8G8B8 => (3, data.pixels),
        Format::R8G8B8A8 => (4, data.pixels),
        Format::R16 => (1, narrow_u16(&data.pixels)),
        Format::R16G16 => (2, narrow_u16(&data.pixels)),
        Format::R16G16B16 => (3, narrow_u16(&data.pixels)),
        Format::R16G16B16A16 => (4, narrow_u16(&data.pixels)),
        Format::R32G32B32FLOAT => (3, narrow_f32(&data.pixels)),
        Format::R32G32B32A32FLOAT => (4, narrow_f32(&data.pixels)),
        #[allow(unreachable_patterns)]
        other => return Err(TextureError::UnsupportedFormat(format!("{:?}", other))),
    };
    TextureImage::new(data.width, data.height, channels, pixels)
}

/// Convert an image decoded by the `image` crate, e.g. a texture referenced by an MTL file.
pub fn image_from_dynamic(img: image::DynamicImage) -> Result<TextureImage, TextureError> {
    use image::DynamicImage;

    let (width, height) = (img.width(), img.height());
    let (channels, pixels) = match img {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        other => {
            let channels = other.color().channel_count();
            match channels {
                1 => (1, other.to_luma8().into_raw()),
                2 => (2, other.to_luma_alpha8().into_raw()),
                3 => (3, other.to_rgb8().into_raw()),
                4 => (4, other.to_rgba8().into_raw()),
                n => return Err(TextureError::UnsupportedChannels(n)),
            }
        }
    };
    TextureImage::new(width, height, channels, pixels)
}

pub async fn load_texture_image(path: &Path) -> anyhow::Result<TextureImage> {
    let data = load_binary(path).await?;
    let img = image::load_from_memory(&data)?;
    Ok(image_from_dynamic(img)?)
}

fn narrow_u16(bytes: &[u8]) -> Vec<u8> {
    bytes
        .chunks_exact(2)
        .map(|c| (u16::from_ne_bytes([c[0], c[1]]) >> 8) as u8)
        .collect()
}

fn narrow_f32(bytes: &[u8]) -> Vec<u8> {
    bytes
        .chunks_exact(4)
        .map(|c| {
            let v = f32::from_ne_bytes([c[0], c[1], c[2], c[3]]);
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_channel_count_of_gltf_images() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let img = image_from_gltf(data).unwrap();
        assert_eq!(img.channels(), 3);
        assert_eq!(img.to_rgba8(), [1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn narrows_sixteen_bit_images() {
        let texel = 0xABCDu16.to_ne_bytes();
        let data = gltf::image::Data {
            pixels: texel.to_vec(),
            format: gltf::image::Format::R16,
            width: 1,
            height: 1,
        };
        let img = image_from_gltf(data).unwrap();
        assert_eq!(img.to_rgba8(), [0xAB, 0, 0, 255]);
    }

    #[test]
    fn luma_images_stay_single_channel() {
        let img = image::DynamicImage::ImageLuma8(image::GrayImage::from_raw(1, 1, vec![7]).unwrap());
        let img = image_from_dynamic(img).unwrap();
        assert_eq!(img.channels(), 1);
        assert_eq!(img.to_rgba8(), [7, 0, 0, 255]);
    }

    #[test]
    fn wide_images_are_narrowed() {
        let img = image::DynamicImage::ImageRgb16(
            image::ImageBuffer::from_raw(1, 1, vec![0xFFFFu16, 0, 0xFFFF]).unwrap(),
        );
        let img = image_from_dynamic(img).unwrap();
        assert_eq!(img.channels(), 3);
        assert_eq!(img.to_rgba8(), [255, 0, 255, 255]);
    }
}
