use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraController, CameraResources, Projection},
    config::ViewerConfig,
    data_structures::{model::MeshResources, texture},
    light::LightResources,
    pipelines::basic::mk_model_pipeline,
    resources::shader::ShaderSources,
};

/// GPU device, window surface and everything shared by all draws.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub mesh_resources: MeshResources,
    pub pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No graphics adapter can present to the window")?;
        log::info!("Adapter: {:?}", adapter.get_info());
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear colour and rely on an Srgb surface for
        // the conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface supports no texture format")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: viewer.present_mode(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let projection = Projection::new(
            config.width,
            config.height,
            viewer.fovy,
            viewer.znear,
            viewer.zfar,
        );
        let camera = CameraResources::new(
            &device,
            Camera::new(viewer.camera_position),
            CameraController::new(
                viewer.camera_speed,
                viewer.camera_boost_speed,
                viewer.camera_sensitivity,
            ),
            &projection,
        );
        let light = LightResources::new(viewer.light, &device);
        let mesh_resources = MeshResources::new(&device, &queue);

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let shaders = ShaderSources::load(&viewer.vertex_shader, &viewer.fragment_shader).await;
        let pipeline = mk_model_pipeline(
            &device,
            config.format,
            &shaders,
            &mesh_resources.texture_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
            &mesh_resources.transform_layout,
        )
        .await?;

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            mesh_resources,
            pipeline,
            clear_colour: viewer.clear_colour,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Reconfigure the surface and depth buffer. Zero sized windows (minimised)
    /// are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        true
    }
}

pub async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .context("Could not open the graphics device")
}
