use wgpu::util::DeviceExt;

use crate::pipelines::basic::mk_uniform_layout;

/// The single point light of the scene.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub color: [f32; 4],
    pub position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
}

impl LightUniform {
    pub fn new(color: [f32; 4], position: [f32; 3]) -> Self {
        Self {
            color,
            position,
            _padding: 0,
        }
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new([1.0, 1.0, 1.0, 1.0], [0.5, 0.5, 0.5])
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Store and upload `uniform` if it differs from the current one.
    pub fn update(&mut self, queue: &wgpu::Queue, uniform: LightUniform) {
        if self.uniform != uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    mk_uniform_layout(device, "light_bind_group_layout")
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_wgsl_struct() {
        // vec4<f32> followed by vec3<f32> rounds up to 32 bytes in WGSL.
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
        let light = LightUniform::default();
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&light));
        assert_eq!(&floats[..7], &[1.0, 1.0, 1.0, 1.0, 0.5, 0.5, 0.5]);
    }
}
