//! Model placement in the world.
//!
//! A [`Transform`] is the translation, rotation and scale a model is drawn
//! with. The shader receives the three parts as separate matrices together
//! with the node matrix baked into each mesh by the loader.

use cgmath::{Euler, One, Rad, SquareMatrix};

#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            translation: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rotation from euler angles in radians around x, y and z.
    pub fn rotation_from_euler(angles: cgmath::Vector3<f32>) -> cgmath::Quaternion<f32> {
        cgmath::Quaternion::from(Euler::new(Rad(angles.x), Rad(angles.y), Rad(angles.z)))
    }

    pub fn translation_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.translation)
    }

    pub fn rotation_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from(self.rotation)
    }

    pub fn scale_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        self.translation_matrix() * self.rotation_matrix() * self.scale_matrix()
    }

    /// The uniform block for one mesh: this transform plus the mesh's node matrix.
    pub fn to_raw(&self, node_matrix: cgmath::Matrix4<f32>) -> TransformUniform {
        TransformUniform {
            translation: self.translation_matrix().into(),
            rotation: self.rotation_matrix().into(),
            scale: self.scale_matrix().into(),
            model: node_matrix.into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw transform is the actual data stored on the GPU, one per mesh.
 * Field order matches the `TransformUniform` struct of the vertex shader.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub translation: [[f32; 4]; 4],
    pub rotation: [[f32; 4]; 4],
    pub scale: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

impl Default for TransformUniform {
    fn default() -> Self {
        Transform::new().to_raw(cgmath::Matrix4::identity())
    }
}
