//! Sprite and text showcase.
//!
//! Keys: `V` toggles vsync, `R` recompiles the sprite shader, `Esc` quits.
//! Editing `crates/sprig-engine/shaders/sprite.wgsl` while this runs reloads it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use sprig_engine::device::{Gpu, GpuInit};
use sprig_engine::logging::{init_logging, LoggingConfig};
use sprig_engine::resource::TextureHandle;
use sprig_engine::shader::SPRITE_SHADER_PATH;
use sprig_engine::text::FontHandle;
use sprig_engine::{Color, FrameStats, Rect, RenderError, Renderer, RendererConfig};

const FONT: &[u8] = include_bytes!("../../sprig-engine/tests/fixtures/DejaVuSansMono.ttf");
const CHECKER_SIZE: u32 = 32;
const SPRITES: usize = 200;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut demo = Demo::new();
    event_loop
        .run_app(&mut demo)
        .context("winit event loop terminated with error")?;
    Ok(())
}

/// Everything that exists once the window is up.
struct Scene {
    window: Arc<Window>,
    renderer: Renderer<Gpu>,
    checker: TextureHandle<Gpu>,
    font: FontHandle<Gpu>,
}

impl Scene {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("sprig demo")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = Gpu::new_blocking(Arc::clone(&window), GpuInit::default())?;
        let config = RendererConfig {
            shader_path: SPRITE_SHADER_PATH.into(),
            ..RendererConfig::default()
        };
        let mut renderer = Renderer::new(gpu, config).context("failed to start renderer")?;

        let checker = renderer
            .create_texture(&checker_pixels(CHECKER_SIZE), CHECKER_SIZE, CHECKER_SIZE)
            .context("failed to create checker texture")?;
        let font = renderer
            .create_font(FONT, 18.0)
            .context("failed to bake demo font")?;

        Ok(Self {
            window,
            renderer,
            checker,
            font,
        })
    }

    fn draw(&mut self, t: f32, vsync: bool, last: FrameStats) -> Result<FrameStats, RenderError> {
        let r = &mut self.renderer;
        r.begin_frame(Color::from_rgba8(24, 26, 33, 255))?;

        let size = r.window_size();
        let (w, h) = (size.width as f32, size.height as f32);

        for i in 0..SPRITES {
            let phase = i as f32 * 0.37;
            let x = (0.5 + 0.45 * (t * 0.6 + phase).sin()) * (w - 48.0);
            let y = (0.5 + 0.4 * (t * 0.9 + phase * 1.3).cos()) * (h - 48.0);
            let hue = i as f32 / SPRITES as f32;
            let tint = Color::new(0.5 + 0.5 * hue, 0.6, 1.0 - 0.5 * hue, 0.85);
            r.draw_sprite(&self.checker, self.checker.bounds(), Rect::new(x, y, 48.0, 48.0), tint)?;
        }

        r.draw_rect(Rect::new(0.0, 0.0, w, 64.0), Color::BLACK.with_alpha(0.65))?;
        let status = format!(
            "draw calls: {}  sprites: {}  vsync: {}\n[V] vsync  [R] reload shader  [Esc] quit",
            last.draw_calls,
            last.sprites,
            if vsync { "on" } else { "off" },
        );
        r.draw_text(&self.font, &status, 10.0, 8.0, Color::WHITE)?;

        if r.shaders().is_fallback_active() {
            let warning = "sprite.wgsl failed to compile; see the log";
            let width = self.font.measure(warning).x;
            r.draw_text(&self.font, warning, w - width - 10.0, 8.0, Color::new(1.0, 0.4, 0.4, 1.0))?;
        }

        r.end_frame(vsync)
    }
}

struct Demo {
    scene: Option<Scene>,
    start: Instant,
    vsync: bool,
    last: FrameStats,
}

impl Demo {
    fn new() -> Self {
        Self {
            scene: None,
            start: Instant::now(),
            vsync: true,
            last: FrameStats::default(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        match scene.draw(self.start.elapsed().as_secs_f32(), self.vsync, self.last) {
            Ok(stats) => self.last = stats,
            Err(RenderError::FrameSkipped(reason)) => log::debug!("frame skipped: {reason}"),
            Err(e) => {
                log::error!("render failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyV => {
                self.vsync = !self.vsync;
                log::info!("vsync {}", if self.vsync { "on" } else { "off" });
            }
            KeyCode::KeyR => {
                if let Some(scene) = self.scene.as_mut() {
                    let outcome = scene.renderer.reload_shader();
                    log::info!("shader reload: {outcome:?}");
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for Demo {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }
        match Scene::new(event_loop) {
            Ok(scene) => {
                scene.window.request_redraw();
                self.scene = Some(scene);
            }
            Err(e) => {
                log::error!("failed to start demo: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(scene) = &self.scene {
            scene.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.on_key(event_loop, key);
                }
            }
            // The renderer picks up the new size at the next begin_frame.
            WindowEvent::Resized(_) => {
                if let Some(scene) = &self.scene {
                    scene.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Two-tone RGBA checkerboard with 8 px cells.
fn checker_pixels(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / 8 + y / 8) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [90, 90, 110, 255]
            }
        })
        .collect()
}
