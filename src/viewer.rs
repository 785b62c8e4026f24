//! Application event loop.
//!
//! [`Viewer`] is the winit [`ApplicationHandler`]. It creates the window and
//! GPU context when the event loop resumes, loads the configured models on its
//! tokio runtime and then renders one frame per `RedrawRequested`:
//!
//! 1. Measure the frame time and record it in the [`FrameStats`]
//! 2. Build the overlay, applying edits to the camera controller and light
//! 3. Move the camera and upload the camera, light and model uniforms
//! 4. Clear and draw every model
//! 5. Draw the overlay on top and present

use std::{iter, sync::Arc};

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::model::{DrawModel, Model},
    gui::{DebugOverlay, FrameStats},
    resources,
};

/// Everything that only exists once the window is up.
struct ViewerState {
    ctx: Context,
    models: Vec<Model>,
    overlay: DebugOverlay,
    stats: FrameStats,
    last_time: Instant,
}

impl ViewerState {
    async fn new(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        let models = resources::load_models(
            &ctx.device,
            &ctx.queue,
            &ctx.mesh_resources,
            &config.asset_dir,
            &config.models,
            config.flip_textures,
        )
        .await?;
        let overlay = DebugOverlay::new(&ctx.window, &ctx.device, ctx.config.format);
        Ok(Self {
            ctx,
            models,
            overlay,
            stats: FrameStats::default(),
            last_time: Instant::now(),
        })
    }

    fn set_looking(&mut self, looking: bool) {
        let window = &self.ctx.window;
        self.ctx.camera.controller.set_looking(looking);
        if looking {
            // Not every platform supports both modes
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("Could not grab the cursor: {}", e);
            }
        } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the cursor: {}", e);
        }
        window.set_cursor_visible(!looking);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        self.stats.record(dt);

        let mut light = self.ctx.light.uniform;
        let overlay_frame = self.overlay.prepare(
            &self.ctx.window,
            &self.stats,
            &mut self.ctx.camera.controller,
            &mut light,
        );

        let (width, height) = (self.ctx.config.width, self.ctx.config.height);
        let camera = &mut self.ctx.camera;
        camera.controller.update(&mut camera.camera, dt, width, height);
        camera.write_uniform(&self.ctx.queue, &self.ctx.projection);
        self.ctx.light.update(&self.ctx.queue, light);
        for model in &self.models {
            model.write_to_buffers(&self.ctx.queue);
        }

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                self.overlay.defer(overlay_frame);
                return Err(e);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.ctx.pipeline);
            for model in &self.models {
                render_pass.draw_model(
                    model,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        let overlay_commands = self.overlay.paint(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &view,
            [width, height],
            overlay_frame,
        );
        self.ctx
            .queue
            .submit(overlay_commands.into_iter().chain(iter::once(encoder.finish())));
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub struct Viewer {
    async_runtime: tokio::runtime::Runtime,
    config: ViewerConfig,
    state: Option<ViewerState>,
    /// Set when start-up failed; returned from [`run`].
    error: Option<anyhow::Error>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new().context("Could not start tokio")?;
        Ok(Self {
            async_runtime,
            config,
            state: None,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                return self.fail(event_loop, anyhow::Error::new(e).context("Could not create the window"));
            }
        };

        match self
            .async_runtime
            .block_on(ViewerState::new(window, &self.config))
        {
            Ok(state) => {
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        let consumed = state.overlay.on_window_event(&state.ctx.window, &event);
        state
            .ctx
            .camera
            .controller
            .handle_window_events(&event, consumed);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.ctx.resize(size.width, size.height);
            }
            WindowEvent::Focused(false) => state.set_looking(false),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed if !consumed && !state.overlay.wants_pointer() => {
                    state.set_looking(true)
                }
                ElementState::Released if state.ctx.camera.controller.is_looking() => {
                    state.set_looking(false)
                }
                _ => (),
            },
            WindowEvent::RedrawRequested => {
                state.ctx.window.request_redraw();
                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        eprintln!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut viewer = Viewer::new(config)?;
    event_loop.run_app(&mut viewer)?;

    match viewer.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
