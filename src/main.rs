use std::path::PathBuf;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use tumble::clock::Clock;
use tumble::controller::input::{native, InputEvent};
use tumble::view::{GpuContext, Renderer};
use tumble::{logging, SceneConfig, SceneContext, StartupError};

/// Config file used when no path is given on the command line.
const CONFIG_ENV: &str = "TUMBLE_CONFIG";

/// Window and GPU state, created on the first `resumed`.
struct Surface {
    window: Arc<Window>,
    renderer: Renderer,
}

struct App {
    ctx: SceneContext,
    surface: Option<Surface>,
    clock: Option<Clock>,
    last_cursor: Option<(f64, f64)>,
    failed: bool,
}

impl App {
    fn new(ctx: SceneContext) -> Self {
        Self { ctx, surface: None, clock: None, last_cursor: None, failed: false }
    }

    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<Surface, StartupError> {
        let attributes = Window::default_attributes()
            .with_title("tumble")
            .with_inner_size(LogicalSize::new(self.ctx.viewport.width, self.ctx.viewport.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| StartupError::Window(e.to_string()))?,
        );

        let physical = window.inner_size();
        let gpu = pollster::block_on(GpuContext::for_window(window.clone(), physical.width, physical.height))?;
        let mut renderer = Renderer::new(gpu);

        let (width, height, scale) = window_metrics(&window);
        self.ctx.attach_renderer(&mut renderer, width, height, scale);
        Ok(Surface { window, renderer })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop) {
        self.failed = true;
        event_loop.exit();
    }
}

/// Logical size and scale factor of the window.
fn window_metrics(window: &Window) -> (u32, u32, f32) {
    let scale = window.scale_factor();
    let logical: LogicalSize<f64> = window.inner_size().to_logical(scale);
    (logical.width.round() as u32, logical.height.round() as u32, scale as f32)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        match self.create_surface(event_loop) {
            Ok(surface) => {
                self.surface = Some(surface);
                self.clock = Some(Clock::start());
                tracing::info!("frame loop started");
            }
            Err(e) => {
                tracing::error!("startup failed: {e}");
                self.fail(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(surface) = &self.surface {
            surface.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        let input = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                None
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let (width, height, scale) = window_metrics(&surface.window);
                self.ctx.on_resize(&mut surface.renderer, width, height, scale);
                None
            }
            WindowEvent::KeyboardInput { event, .. } => native::key_event_to_input(&event),
            WindowEvent::MouseInput { state, button, .. } => native::mouse_button_to_input(state, button),
            WindowEvent::CursorMoved { position, .. } => {
                let scale = surface.window.scale_factor();
                let moved = self.last_cursor.map(|(x, y)| InputEvent::PointerMove {
                    dx: ((position.x - x) / scale) as f32,
                    dy: ((position.y - y) / scale) as f32,
                });
                self.last_cursor = Some((position.x, position.y));
                moved
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                None
            }
            WindowEvent::MouseWheel { delta, .. } => Some(native::mouse_wheel_to_input(delta)),
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            WindowEvent::RedrawRequested => {
                let elapsed = self.clock.as_ref().map_or(0.0, Clock::elapsed_seconds);
                if let Err(e) = self.ctx.tick(elapsed, &mut surface.renderer) {
                    tracing::error!("fatal render error: {e}");
                    self.fail(event_loop);
                }
                None
            }
            _ => None,
        };

        if let Some(input) = input {
            self.ctx.on_input(&input);
        }
    }
}

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn run() -> Result<bool, StartupError> {
    let config = match config_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading scene config");
            SceneConfig::load(&path)?
        }
        None => SceneConfig::default(),
    };
    let ctx = SceneContext::new(config)?;

    let event_loop = EventLoop::new().map_err(|e| StartupError::EventLoop(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(ctx);
    event_loop
        .run_app(&mut app)
        .map_err(|e| StartupError::EventLoop(e.to_string()))?;
    Ok(!app.failed)
}

fn main() {
    logging::init();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
