//! Free-fly camera, its input controller and the view/projection uniform.
//!
//! The camera keeps a position and a look direction. The [`CameraController`]
//! collects keyboard and mouse state from winit events and applies it once per
//! frame, scaled by the frame time.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Rotation, Rotation3, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::pipelines::basic::mk_uniform_layout;

/// wgpu's clip space has z in [0, 1] where cgmath produces OpenGL's [-1, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Maximum angle the look direction may be tilted away from the horizon.
const MAX_PITCH_DEG: f32 = 85.0;

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub orientation: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P) -> Self {
        Self {
            position: position.into(),
            orientation: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
        }
    }

    /// Unit vector pointing to the right of the look direction.
    pub fn right(&self) -> Vector3<f32> {
        self.orientation.cross(self.up).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.orientation, self.up)
    }

    /// Tilt the look direction up or down by `angle`. Rejected when the result
    /// would look steeper than [`MAX_PITCH_DEG`] above or below the horizon.
    pub fn pitch(&mut self, angle: Rad<f32>) -> bool {
        let rotation = cgmath::Quaternion::from_axis_angle(self.right(), angle);
        let orientation = rotation.rotate_vector(self.orientation).normalize();
        let from_horizon = (orientation.angle(self.up) - Rad::from(cgmath::Deg(90.0))).0.abs();
        if from_horizon <= Rad::from(cgmath::Deg(MAX_PITCH_DEG)).0 {
            self.orientation = orientation;
            true
        } else {
            false
        }
    }

    /// Turn the look direction around the up axis.
    pub fn yaw(&mut self, angle: Rad<f32>) {
        let rotation = cgmath::Quaternion::from_axis_angle(self.up, angle);
        self.orientation = rotation.rotate_vector(self.orientation).normalize();
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/**
 * Uniform block of the camera. `cam_matrix` is projection * view and
 * `cam_pos` the eye position used for specular highlights.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub cam_matrix: [[f32; 4]; 4],
    pub cam_pos: [f32; 3],
    _padding: u32,
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            cam_matrix: cgmath::Matrix4::identity().into(),
            cam_pos: [0.0; 3],
            _padding: 0,
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.cam_pos = camera.position.into();
        self.cam_matrix = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state and the GPU objects it is uploaded through.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        camera: Camera,
        controller: CameraController,
        projection: &Projection,
    ) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_uniform_layout(device, "camera_bind_group_layout");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Recompute the view-projection and upload it.
    pub fn write_uniform(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Keyboard/mouse driven movement.
///
/// W/S move along the look direction, A/D strafe, Space/Left Ctrl move along
/// the up axis and Left Shift switches to the boost speed. Looking around only
/// happens while the left mouse button is held.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub speed: f32,
    pub boost_speed: f32,
    /// Degrees turned when the mouse travels one full window extent.
    pub sensitivity: f32,
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    boost: bool,
    looking: bool,
    rotate_horizontal: f32,
    rotate_vertical: f32,
}

impl CameraController {
    pub fn new(speed: f32, boost_speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            boost_speed,
            sensitivity,
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            boost: false,
            looking: false,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
        }
    }

    /// Returns whether the key was one of the movement keys.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::Space => self.up = pressed,
            KeyCode::ControlLeft => self.down = pressed,
            KeyCode::ShiftLeft => self.boost = pressed,
            _ => return false,
        }
        true
    }

    /// Like [`Self::process_keyboard`], for keys another input consumer may
    /// have `captured`. Captured presses are dropped, releases always apply
    /// so no key stays held after it was let go.
    pub fn process_key(&mut self, key: KeyCode, state: ElementState, captured: bool) -> bool {
        if captured && state == ElementState::Pressed {
            return false;
        }
        self.process_keyboard(key, state)
    }

    /// `captured` is set when the event was already consumed by the overlay.
    pub fn handle_window_events(&mut self, event: &WindowEvent, captured: bool) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.process_key(*key, *state, captured),
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    pub fn set_looking(&mut self, looking: bool) {
        self.looking = looking;
        if !looking {
            self.rotate_horizontal = 0.0;
            self.rotate_vertical = 0.0;
        }
    }

    pub fn is_looking(&self) -> bool {
        self.looking
    }

    /// Accumulate raw mouse motion in pixels, applied on the next update.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if self.looking {
            self.rotate_horizontal += dx as f32;
            self.rotate_vertical += dy as f32;
        }
    }

    fn release_all(&mut self) {
        *self = Self::new(self.speed, self.boost_speed, self.sensitivity);
    }

    /// Apply the collected input. `width`/`height` are the window size the
    /// mouse motion is measured against.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration, width: u32, height: u32) {
        let dt = dt.as_secs_f32();
        let speed = if self.boost { self.boost_speed } else { self.speed };
        let amount = |positive: bool, negative: bool| {
            (positive as i32 - negative as i32) as f32 * speed * dt
        };

        let right = camera.right();
        camera.position += camera.orientation * amount(self.forward, self.backward);
        camera.position += right * amount(self.right, self.left);
        camera.position += camera.up * amount(self.up, self.down);

        if self.looking {
            let rot_x = self.sensitivity * self.rotate_vertical / height.max(1) as f32;
            let rot_y = self.sensitivity * self.rotate_horizontal / width.max(1) as f32;
            camera.pitch(Rad::from(cgmath::Deg(-rot_x)));
            camera.yaw(Rad::from(cgmath::Deg(-rot_y)));
        }
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
    }
}
