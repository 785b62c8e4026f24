//! Meshes and models: the GPU side of a loaded model file.
//!
//! A [`Mesh`] owns its vertex buffer, index buffer, texture bind group and a
//! small uniform buffer with its transform matrices. A [`Model`] is the list of
//! meshes loaded from one file plus the transform it is placed in the scene with.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        texture::{Texture, TextureKind, assign_texture_slots, create_default_sampler},
        transform::{Transform, TransformUniform},
    },
    pipelines::basic::mk_transform_layout,
    resources::texture::{SHADER_TEXTURE_SLOTS, diffuse_specular_layout},
};

/// Anything that can describe its own vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// The vertex layout shared by every mesh: position, normal, colour and
/// texture coordinates, tightly packed.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 9]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Layouts and fallback textures every mesh is created against.
#[derive(Debug)]
pub struct MeshResources {
    pub texture_layout: wgpu::BindGroupLayout,
    pub transform_layout: wgpu::BindGroupLayout,
    /// Bound for diffuse slots a mesh has no texture for.
    pub white: Texture,
    /// Bound for specular slots a mesh has no texture for.
    pub black: Texture,
    pub sampler: wgpu::Sampler,
}

impl MeshResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            texture_layout: diffuse_specular_layout(device),
            transform_layout: mk_transform_layout(device),
            white: Texture::solid_colour(
                device,
                queue,
                [255, 255, 255, 255],
                TextureKind::Diffuse,
                "fallback diffuse",
            ),
            black: Texture::solid_colour(
                device,
                queue,
                [0, 0, 0, 255],
                TextureKind::Specular,
                "fallback specular",
            ),
            sampler: create_default_sampler(device),
        }
    }

    fn fallback(&self, kind: TextureKind) -> &Texture {
        match kind {
            TextureKind::Diffuse => &self.white,
            TextureKind::Specular => &self.black,
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub textures: Vec<(TextureKind, Texture)>,
    pub texture_bind_group: wgpu::BindGroup,
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
    /// Accumulated node matrix from the model file, uploaded as `model`.
    pub node_matrix: cgmath::Matrix4<f32>,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        resources: &MeshResources,
        name: &str,
        vertices: &[ModelVertex],
        indices: &[u32],
        textures: Vec<(TextureKind, Texture)>,
        node_matrix: cgmath::Matrix4<f32>,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let texture_bind_group = mk_texture_bind_group(device, resources, name, &textures);

        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Transform Buffer", name)),
            contents: bytemuck::cast_slice(&[Transform::new().to_raw(node_matrix)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &resources.transform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
            label: Some(&format!("{:?} transform_bind_group", name)),
        });

        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
            textures,
            texture_bind_group,
            transform_buffer,
            transform_bind_group,
            node_matrix,
        }
    }

    /// Upload `translation`, `rotation`, `scale` and `model` for the next draw.
    pub fn write_transform(&self, queue: &wgpu::Queue, transform: &Transform) {
        let raw: TransformUniform = transform.to_raw(self.node_matrix);
        queue.write_buffer(&self.transform_buffer, 0, bytemuck::cast_slice(&[raw]));
    }
}

/// What a shader texture slot gets bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotBinding {
    /// Index into the mesh's texture list.
    Texture(usize),
    /// Nothing claims the slot; the solid colour fallback for the kind.
    Fallback(TextureKind),
}

/// Match the textures of a mesh, given by kind in binding order, to the
/// slots the shader samples. Returns one binding per [`SHADER_TEXTURE_SLOTS`]
/// entry. Textures whose slot name the shader does not declare are dropped.
pub fn bind_shader_slots(kinds: &[TextureKind]) -> Vec<SlotBinding> {
    let slots = assign_texture_slots(kinds);
    SHADER_TEXTURE_SLOTS
        .iter()
        .map(|(slot_name, kind)| {
            slots
                .iter()
                .position(|slot| slot.name == *slot_name)
                .map_or(SlotBinding::Fallback(*kind), SlotBinding::Texture)
        })
        .collect()
}

/**
 * Binds the mesh textures to the slots the shader declares. Shader slots no
 * texture claims get the white/black fallback so the layout is always complete.
 */
fn mk_texture_bind_group(
    device: &wgpu::Device,
    resources: &MeshResources,
    name: &str,
    textures: &[(TextureKind, Texture)],
) -> wgpu::BindGroup {
    let kinds: Vec<TextureKind> = textures.iter().map(|(kind, _)| *kind).collect();
    for slot in assign_texture_slots(&kinds) {
        log::debug!("Mesh {}: {} on unit {}", name, slot.name, slot.unit);
    }

    let bindings = bind_shader_slots(&kinds);
    let used = bindings
        .iter()
        .filter(|b| matches!(b, SlotBinding::Texture(_)))
        .count();
    if used < textures.len() {
        log::debug!(
            "Mesh {} has {} textures, the shader samples {}",
            name,
            textures.len(),
            used
        );
    }
    let bound: Vec<&Texture> = bindings
        .iter()
        .zip(SHADER_TEXTURE_SLOTS)
        .map(|(binding, (_, kind))| match *binding {
            SlotBinding::Texture(i) => textures
                .get(i)
                .map_or_else(|| resources.fallback(kind), |(_, texture)| texture),
            SlotBinding::Fallback(kind) => resources.fallback(kind),
        })
        .collect();

    let entries: Vec<wgpu::BindGroupEntry> = bound
        .iter()
        .enumerate()
        .flat_map(|(i, texture)| {
            let binding = i as u32 * 2;
            [
                wgpu::BindGroupEntry {
                    binding,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: binding + 1,
                    resource: wgpu::BindingResource::Sampler(
                        texture.sampler.as_ref().unwrap_or(&resources.sampler),
                    ),
                },
            ]
        })
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &resources.texture_layout,
        entries: &entries,
        label: Some(&format!("{:?} texture_bind_group", name)),
    })
}

/// All meshes of one model file and where the model sits in the scene.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Transform,
}

impl Model {
    pub fn set_position(&mut self, position: cgmath::Vector3<f32>) {
        self.transform.translation = position;
    }

    /// Euler angles in radians around x, y and z.
    pub fn set_rotation(&mut self, angles: cgmath::Vector3<f32>) {
        self.transform.rotation = Transform::rotation_from_euler(angles);
    }

    /// Uniform scale on all axes.
    pub fn set_scale(&mut self, scale: f32) {
        self.transform.scale = cgmath::Vector3::new(scale, scale, scale);
    }

    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        for mesh in &self.meshes {
            mesh.write_transform(queue, &self.transform);
        }
    }
}

/// Draw calls for meshes and models. Implemented on [`wgpu::RenderPass`].
pub trait DrawModel {
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );

    fn draw_model(
        &mut self,
        model: &Model,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        self.set_bind_group(0, &mesh.texture_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.set_bind_group(3, &mesh.transform_bind_group, &[]);
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(
        &mut self,
        model: &Model,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            if mesh.num_elements == 0 {
                continue;
            }
            self.draw_mesh(mesh, camera_bind_group, light_bind_group);
        }
    }
}
