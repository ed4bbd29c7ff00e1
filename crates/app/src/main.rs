//! Prism: real-time Vulkan demo.
//!
//! Opens a window, renders the demo scene with N frames in flight and maps
//! the keyboard onto the camera. A fatal renderer error closes the window
//! and makes the process exit with a failure status.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent};
use winit::event_loop::ControlFlow;
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use prism_platform::{ActiveEventLoop, EventLoop, InputState, KeyCode, Window, WindowEvent};
use prism_renderer::{Renderer, RendererConfig};
use prism_scene::CameraInput;

use crate::cli::Cli;

/// One-shot commands bound to keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyAction {
    Quit,
    ToggleWireframe,
    TogglePause,
    ResetCamera,
}

/// The command a fresh press of `key` triggers. OS auto-repeat triggers none.
fn key_action(key: KeyCode, repeat: bool) -> Option<KeyAction> {
    if repeat {
        return None;
    }
    match key {
        KeyCode::Escape => Some(KeyAction::Quit),
        KeyCode::KeyF => Some(KeyAction::ToggleWireframe),
        KeyCode::Space => Some(KeyAction::TogglePause),
        KeyCode::KeyR => Some(KeyAction::ResetCamera),
        _ => None,
    }
}

struct App {
    config: RendererConfig,
    // Dropped before the window it renders to.
    renderer: Option<Renderer>,
    window: Option<Window>,
    input: InputState,
    /// First fatal error; reported by `main` once the loop has exited.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            input: InputState::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.renderer = None;
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(
            event_loop,
            self.config.width,
            self.config.height,
            &self.config.title,
        )
        .context("failed to create window")?;
        let renderer = Renderer::new(&window, &self.config).context("failed to initialize renderer")?;

        info!("Initialization complete, entering main loop");
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn camera_input(&self) -> CameraInput {
        let input = &self.input;
        CameraInput {
            forward: input.axis(KeyCode::KeyS, KeyCode::KeyW),
            right: input.axis(KeyCode::KeyA, KeyCode::KeyD),
            up: input.axis(KeyCode::KeyQ, KeyCode::KeyE),
            yaw: input.axis(KeyCode::ArrowRight, KeyCode::ArrowLeft),
            pitch: input.axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };

        if event.state == ElementState::Released {
            self.input.on_key_released(key);
            return;
        }

        self.input.on_key_pressed(key);
        if !self.input.is_key_just_pressed(key) {
            return;
        }
        let Some(action) = key_action(key, event.repeat) else {
            return;
        };

        match action {
            KeyAction::Quit => {
                info!("Escape pressed, shutting down");
                event_loop.exit();
            }
            KeyAction::ToggleWireframe => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.toggle_wireframe();
                }
            }
            KeyAction::TogglePause => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.toggle_pause();
                }
            }
            KeyAction::ResetCamera => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.reset_camera();
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let camera_input = self.camera_input();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        renderer.update(&camera_input);
        let result = renderer.render_frame();
        self.input.end_frame();

        if let Err(e) = result {
            self.fail(event_loop, anyhow::Error::new(e).context("frame failed"));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = self.window.as_mut() {
                    window.resize(size.width, size.height);
                }
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GPU teardown while the window and its surface are still alive.
        self.renderer = None;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    prism_core::init_logging(&cli.log_level)?;

    let config = cli.renderer_config();
    config.validate()?;
    info!("Starting Prism ({:?})", config.surface_policy);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => {
            info!("Exited cleanly");
            Ok(())
        }
    }
}
