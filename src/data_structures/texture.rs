//! GPU textures, decoded images and texture slot assignment.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! [`TextureImage`], the decoded CPU-side pixels a texture is created from, and
//! [`assign_texture_slots`] which decides under which shader name and unit every
//! texture of a mesh is bound.

use std::fmt;

use image::{ImageBuffer, Rgba, imageops::FilterType};

/// Semantic tag of a mesh texture. Decides both the colour space of the GPU
/// texture and the shader slot name it is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
        }
    }

    /// Colour maps are sampled in sRGB, data maps linearly.
    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Diffuse => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureKind::Specular => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a texture ends up for a draw call: the shader-side name (`diffuse0`,
/// `specular1`, ...) and the texture unit it occupies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureSlot {
    pub name: String,
    pub unit: u32,
}

/// Assign shader slots to the textures of a mesh in order.
///
/// Texture `i` always gets unit `i`. The name is the kind tag followed by a
/// counter that is kept separately for every kind, so two diffuse maps and a
/// specular map become `diffuse0`, `diffuse1` and `specular0`.
pub fn assign_texture_slots(kinds: &[TextureKind]) -> Vec<TextureSlot> {
    let mut num_diffuse = 0;
    let mut num_specular = 0;
    kinds
        .iter()
        .enumerate()
        .map(|(unit, kind)| {
            let counter = match kind {
                TextureKind::Diffuse => &mut num_diffuse,
                TextureKind::Specular => &mut num_specular,
            };
            let name = format!("{}{}", kind, counter);
            *counter += 1;
            TextureSlot {
                name,
                unit: unit as u32,
            }
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("unsupported channel count {0}, expected 1 to 4")]
    UnsupportedChannels(u8),

    #[error("expected {expected} bytes for the image but got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(String),

    #[error("image has no pixels")]
    Empty,
}

/// Decoded 8-bit pixels with 1 to 4 interleaved channels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl TextureImage {
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureError> {
        if !(1..=4).contains(&channels) {
            return Err(TextureError::UnsupportedChannels(channels));
        }
        if width == 0 || height == 0 {
            return Err(TextureError::Empty);
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Expand to RGBA8 the way the GPU unpacks narrower formats: missing
    /// colour channels become 0 and a missing alpha becomes opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let channels = self.channels as usize;
        if channels == 4 {
            return self.pixels.clone();
        }
        let mut rgba = Vec::with_capacity(self.pixels.len() / channels * 4);
        for texel in self.pixels.chunks_exact(channels) {
            let mut out = [0, 0, 0, 255];
            out[..channels].copy_from_slice(texel);
            rgba.extend_from_slice(&out);
        }
        rgba
    }

    pub fn flipped_vertically(&self) -> Self {
        let row = self.width as usize * self.channels as usize;
        let pixels = self
            .pixels
            .chunks_exact(row)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self {
            pixels,
            ..self.clone()
        }
    }
}

/// Number of mip levels of a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// A GPU texture with a view and optional sampler.
///
/// Textures are used for colour maps, specular maps and depth. Typically created via
/// [`from_texture_image`](Self::from_texture_image) or
/// [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// A 1x1 texture of a single colour, bound for slots a mesh doesn't fill.
    pub fn solid_colour(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        kind: TextureKind,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    /// Upload a decoded image together with its full mip chain.
    ///
    /// Narrow images are expanded to RGBA8 first (see [`TextureImage::to_rgba8`]).
    /// The mip levels are downscaled on the CPU as wgpu has no equivalent of a
    /// driver-side mipmap generation.
    pub fn from_texture_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &TextureImage,
        kind: TextureKind,
        label: Option<&str>,
    ) -> anyhow::Result<Self> {
        let (width, height) = (img.width(), img.height());
        let base: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, img.to_rgba8()).ok_or_else(|| {
                anyhow::anyhow!("Image buffer of {:?} is smaller than its dimensions", label)
            })?;
        let mip_level_count = mip_level_count(width, height);

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for level in 0..mip_level_count {
            let level_width = (width >> level).max(1);
            let level_height = (height >> level).max(1);
            let level_image = if level == 0 {
                base.clone()
            } else {
                image::imageops::resize(&base, level_width, level_height, FilterType::Triangle)
            };
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                },
                &level_image,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// Linear filtering on every axis including mips, repeat wrapping.
pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
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
    fn slots_count_each_kind_separately() {
        let slots = assign_texture_slots(&[
            TextureKind::Diffuse,
            TextureKind::Specular,
            TextureKind::Diffuse,
        ]);
        let names: Vec<_> = slots.iter().map(|s| s.name.as_str()).collect();
        let units: Vec<_> = slots.iter().map(|s| s.unit).collect();
        assert_eq!(names, ["diffuse0", "specular0", "diffuse1"]);
        assert_eq!(units, [0, 1, 2]);
    }

    #[test]
    fn no_textures_no_slots() {
        assert!(assign_texture_slots(&[]).is_empty());
    }

    #[test]
    fn rejects_unsupported_channel_counts() {
        assert!(matches!(
            TextureImage::new(1, 1, 0, vec![]),
            Err(TextureError::UnsupportedChannels(0))
        ));
        assert!(matches!(
            TextureImage::new(1, 1, 5, vec![0; 5]),
            Err(TextureError::UnsupportedChannels(5))
        ));
        assert!(matches!(
            TextureImage::new(0, 4, 4, vec![]),
            Err(TextureError::Empty)
        ));
    }

    #[test]
    fn rejects_short_pixel_buffers() {
        let err = TextureImage::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            TextureError::SizeMismatch {
                expected: 12,
                actual: 11
            }
        ));
    }

    #[test]
    fn expands_narrow_formats_like_the_gpu_unpacks_them() {
        let red = TextureImage::new(1, 1, 1, vec![10]).unwrap();
        assert_eq!(red.to_rgba8(), [10, 0, 0, 255]);

        let rg = TextureImage::new(1, 1, 2, vec![10, 20]).unwrap();
        assert_eq!(rg.to_rgba8(), [10, 20, 0, 255]);

        let rgb = TextureImage::new(2, 1, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(rgb.to_rgba8(), [1, 2, 3, 255, 4, 5, 6, 255]);

        let rgba = TextureImage::new(1, 1, 4, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(rgba.to_rgba8(), [1, 2, 3, 4]);
    }

    #[test]
    fn flips_rows() {
        let img = TextureImage::new(1, 3, 1, vec![1, 2, 3]).unwrap();
        assert_eq!(img.flipped_vertically().to_rgba8()[0], 3);
        assert_eq!(img.flipped_vertically().flipped_vertically(), img);
    }

    #[test]
    fn mip_chain_reaches_one_pixel() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(1024, 512), 11);
        assert_eq!(mip_level_count(300, 20), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }
}
