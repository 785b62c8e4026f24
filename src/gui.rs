//! Debug overlay drawn with egui on top of the scene.
//!
//! The overlay shows the average frame time and, behind a checkbox, a settings
//! window for the camera controller and the light. It is built once per frame
//! ([`DebugOverlay::prepare`]) before the scene is updated and painted in its
//! own render pass after the scene ([`DebugOverlay::paint`]).

use std::collections::VecDeque;

use instant::Duration;
use winit::window::Window;

use crate::{camera::CameraController, light::LightUniform};

/// Number of frames the averages are computed over.
pub const FRAME_WINDOW: usize = 60;

/// Rolling frame-time statistics.
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    total: Duration,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(FRAME_WINDOW),
            total: Duration::ZERO,
        }
    }
}

impl FrameStats {
    pub fn record(&mut self, dt: Duration) {
        if self.frame_times.len() == FRAME_WINDOW {
            if let Some(oldest) = self.frame_times.pop_front() {
                self.total -= oldest;
            }
        }
        self.frame_times.push_back(dt);
        self.total += dt;
    }

    pub fn average_frame_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let ms = self.average_frame_ms();
        if ms > 0.0 { 1000.0 / ms } else { 0.0 }
    }

    pub fn summary(&self) -> String {
        format!(
            "Application average {:.3} ms/frame ({:.1} FPS)",
            self.average_frame_ms(),
            self.fps()
        )
    }
}

/// Everything egui produced for one frame, waiting to be painted.
pub struct OverlayFrame {
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    pixels_per_point: f32,
}

/// The egui side of the overlay, independent of window and GPU.
///
/// egui hands out every texture update exactly once. Frames that are never
/// painted must be given back through [`OverlayUi::defer`] so their texture
/// updates (the font atlas on the first frame) reach the next painted frame.
pub struct OverlayUi {
    ctx: egui::Context,
    pub show_settings: bool,
    pending_textures: egui::TexturesDelta,
}

impl OverlayUi {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            show_settings: false,
            pending_textures: egui::TexturesDelta::default(),
        }
    }

    pub fn ctx(&self) -> &egui::Context {
        &self.ctx
    }

    /// Lay out one frame. Edits made in the settings window are applied to
    /// `controller` and `light` right away.
    pub fn run(
        &mut self,
        raw_input: egui::RawInput,
        stats: &FrameStats,
        controller: &mut CameraController,
        light: &mut LightUniform,
    ) -> (OverlayFrame, egui::PlatformOutput) {
        let show_settings = &mut self.show_settings;
        let full_output = self.ctx.run(raw_input, |ctx| {
            layout(ctx, stats, show_settings, controller, light);
        });
        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let mut textures_delta = std::mem::take(&mut self.pending_textures);
        textures_delta.append(full_output.textures_delta);
        let frame = OverlayFrame {
            paint_jobs,
            textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        };
        (frame, full_output.platform_output)
    }

    /// Keep the texture updates of a frame that could not be painted.
    pub fn defer(&mut self, frame: OverlayFrame) {
        self.pending_textures.append(frame.textures_delta);
    }
}

pub struct DebugOverlay {
    pub ui: OverlayUi,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl std::fmt::Debug for DebugOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugOverlay")
            .field("show_settings", &self.ui.show_settings)
            .finish()
    }
}

impl DebugOverlay {
    pub fn new(window: &Window, device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let max_texture_side = device.limits().max_texture_dimension_2d as usize;
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(max_texture_side),
        );
        let renderer = egui_wgpu::Renderer::new(device, color_format, None, 1, false);
        Self {
            ui: OverlayUi::new(ctx),
            state,
            renderer,
        }
    }

    /// Feed a window event to egui. Returns true if egui wants it for itself.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the pointer is over an overlay window.
    pub fn wants_pointer(&self) -> bool {
        self.ui.ctx().wants_pointer_input()
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        stats: &FrameStats,
        controller: &mut CameraController,
        light: &mut LightUniform,
    ) -> OverlayFrame {
        let raw_input = self.state.take_egui_input(window);
        let (frame, platform_output) = self.ui.run(raw_input, stats, controller, light);
        self.state.handle_platform_output(window, platform_output);
        frame
    }

    /// See [`OverlayUi::defer`].
    pub fn defer(&mut self, frame: OverlayFrame) {
        self.ui.defer(frame);
    }

    /// Record the overlay pass on top of `view`. The returned command buffers
    /// have to be submitted before `encoder`.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        frame: OverlayFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: frame.pixels_per_point,
        };
        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let callbacks =
            self.renderer
                .update_buffers(device, queue, encoder, &frame.paint_jobs, &screen);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.renderer
                .render(&mut render_pass.forget_lifetime(), &frame.paint_jobs, &screen);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
        callbacks
    }
}

/// The overlay windows. Kept free of any GPU state.
pub fn layout(
    ctx: &egui::Context,
    stats: &FrameStats,
    show_settings: &mut bool,
    controller: &mut CameraController,
    light: &mut LightUniform,
) {
    egui::Window::new("Debug").show(ctx, |ui| {
        ui.label(stats.summary());
        ui.checkbox(show_settings, "Settings");
    });

    egui::Window::new("Settings")
        .open(show_settings)
        .show(ctx, |ui| {
            ui.heading("Camera");
            ui.add(egui::Slider::new(&mut controller.speed, 0.0..=10.0).text("speed"));
            ui.add(egui::Slider::new(&mut controller.boost_speed, 0.0..=40.0).text("boost speed"));
            ui.add(egui::Slider::new(&mut controller.sensitivity, 1.0..=500.0).text("sensitivity"));
            ui.separator();
            ui.heading("Light");
            ui.horizontal(|ui| {
                ui.label("color");
                ui.color_edit_button_rgba_unmultiplied(&mut light.color);
            });
            ui.horizontal(|ui| {
                ui.label("position");
                for axis in light.position.iter_mut() {
                    ui.add(egui::DragValue::new(axis).speed(0.05));
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_recorded_frames() {
        let mut stats = FrameStats::default();
        assert_eq!(stats.average_frame_ms(), 0.0);
        assert_eq!(stats.fps(), 0.0);

        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(30));
        assert!((stats.average_frame_ms() - 20.0).abs() < 1e-3);
        assert!((stats.fps() - 50.0).abs() < 1e-2);
    }

    #[test]
    fn only_keeps_the_last_frames() {
        let mut stats = FrameStats::default();
        for _ in 0..FRAME_WINDOW {
            stats.record(Duration::from_millis(100));
        }
        for _ in 0..FRAME_WINDOW {
            stats.record(Duration::from_millis(4));
        }
        assert!((stats.average_frame_ms() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn summary_text() {
        let mut stats = FrameStats::default();
        stats.record(Duration::from_millis(8));
        assert_eq!(stats.summary(), "Application average 8.000 ms/frame (125.0 FPS)");
    }

    fn has_full_font_atlas(frame: &OverlayFrame) -> bool {
        frame
            .textures_delta
            .set
            .iter()
            .any(|(id, delta)| *id == egui::TextureId::default() && delta.pos.is_none())
    }

    #[test]
    fn deferred_frames_hand_their_textures_to_the_next_frame() {
        let mut ui = OverlayUi::new(egui::Context::default());
        let stats = FrameStats::default();
        let mut controller = CameraController::new(1.0, 4.0, 100.0);
        let mut light = LightUniform::default();

        let (first, _) = ui.run(egui::RawInput::default(), &stats, &mut controller, &mut light);
        assert!(has_full_font_atlas(&first));

        // The surface was not available, so nothing got painted
        ui.defer(first);
        let (second, _) = ui.run(egui::RawInput::default(), &stats, &mut controller, &mut light);
        assert!(has_full_font_atlas(&second));

        let (third, _) = ui.run(egui::RawInput::default(), &stats, &mut controller, &mut light);
        assert!(!has_full_font_atlas(&third));
    }

    #[test]
    fn layout_runs_without_a_window() {
        let ctx = egui::Context::default();
        let stats = FrameStats::default();
        let mut controller = CameraController::new(1.0, 4.0, 100.0);
        let mut light = LightUniform::default();
        for show_settings in [false, true] {
            let mut show = show_settings;
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                layout(ctx, &stats, &mut show, &mut controller, &mut light);
            });
            assert_eq!(show, show_settings);
        }
        assert_eq!(light, LightUniform::default());
    }
}
