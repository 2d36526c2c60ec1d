//! Wavesurface - animated, seamlessly tiled water surface viewer
//!
//! Builds a grid of water tiles that share one wave parameter set, advances
//! them every frame and draws them with wgpu.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::Vec3;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use wavesurface::camera::CameraSystem;
use wavesurface::cli::Args;
use wavesurface::params::{RecordingConfig, RenderConfig};
use wavesurface::rendering::{RenderSystem, Uniforms};
use wavesurface::SurfacePatchSet;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    patches: SurfacePatchSet,
    camera: CameraSystem,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,

    // Time tracking
    start_time: Instant,
    frame_count: usize,
}

impl App {
    fn new(args: &Args) -> wavesurface::Result<Self> {
        let surface_config = args.surface_config()?;
        let patches = SurfacePatchSet::from_config(&surface_config, Vec3::ZERO)?;
        let camera = CameraSystem::new(args.parse_camera_preset(), Vec3::ZERO);
        let recording_config = args.create_recording_config()?;

        if let Some(ref config) = recording_config {
            info!(
                "Recording {} frames at {} FPS to {}",
                config.total_frames(),
                config.fps,
                config.frames_dir()
            );
        }

        Ok(Self {
            window: None,
            render_system: None,
            patches,
            camera,
            render_config: RenderConfig {
                wireframe: args.wireframe,
                ..RenderConfig::default()
            },
            recording_config,
            start_time: Instant::now(),
            frame_count: 0,
        })
    }

    /// Simulation clock: wall time when live, fixed steps when recording
    fn elapsed_ms(&self) -> u32 {
        match &self.recording_config {
            Some(config) => {
                let ms = self.frame_count as u64 * u64::from(config.frame_interval_ms());
                u32::try_from(ms).unwrap_or(u32::MAX)
            }
            None => u32::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u32::MAX),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("Wavesurface")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ))
            .with_resizable(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.render_config,
            self.recording_config.clone(),
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        for tile in self.patches.tiles_mut() {
            render_system.add_tile(tile);
        }

        info!("Wavesurface is running with {} tiles", self.patches.len());
        info!("Press ESC to quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                self.render_frame();

                if let Some(ref config) = self.recording_config {
                    if self.frame_count >= config.total_frames() {
                        info!("Recording complete: {} frames", self.frame_count);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

impl App {
    /// Advance the water and render a single frame
    fn render_frame(&mut self) {
        let elapsed_ms = self.elapsed_ms();

        // A rejected tick leaves every tile at its previous state
        if let Err(e) = self.patches.advance_all(elapsed_ms) {
            warn!("Water update failed at {}ms: {}", elapsed_ms, e);
        }

        let Some(ref render_system) = self.render_system else {
            return;
        };

        for (index, tile) in self.patches.tiles_mut().iter_mut().enumerate() {
            render_system.sync_tile(index, tile);
        }

        let time_s = elapsed_ms as f32 / 1000.0;
        let (view_proj, camera_pos) = self
            .camera
            .create_view_proj_matrix(time_s, &self.render_config);
        render_system.update_uniforms(&Uniforms::new(view_proj, camera_pos));

        if let Err(e) = render_system.render(self.frame_count) {
            error!("Render error: {:?}", e);
        }
        self.frame_count += 1;
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut app = match App::new(&args) {
        Ok(app) => app,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop error: {}", e);
    }
}
