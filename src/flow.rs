//! Flow control and application event loop.
//!
//! A [`Scene`] is the unit the host drives: it is initialised once, then
//! updated and drawn once per displayed frame, and torn down when the window
//! closes. [`run`] owns the window, the GPU [`Context`] and the keyboard state
//! and calls into the scene.
//!
//! # Lifecycle Flow
//!
//! 1. `resumed`: create the window and context, call [`Scene::init`]
//! 2. Collect window events into the [`Keyboard`] state
//! 3. On every redraw: [`Scene::update`] with the elapsed seconds, then
//!    [`Scene::draw`] into the context
//! 4. Submit the recorded frame and present it
//! 5. `exiting`: call [`Scene::deinit`]

use std::sync::Arc;

use instant::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{context::Context, device::RenderDevice, input::Keyboard, settings::Settings};

///
/// Output of [`Scene::update`].
///
/// `Out::Exit` asks the host to close the window. The frame that requested it
/// is still drawn.
///
/// `Empty` is the default output used when the scene keeps running.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Out {
    #[default]
    Empty,
    Exit,
}

/// A scene driven by the host window.
///
/// # Lifecycle
///
/// 1. `init()` is called once before anything else; create GPU resources here
/// 2. `update()` is called every frame with the elapsed time in seconds
/// 3. `draw()` is called every frame right after `update()`
/// 4. `deinit()` is called once the loop ends and must release what `init()` created
///
pub trait Scene {
    /// Create GPU resources. Errors abort startup.
    fn init(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<()>;

    /// Advance the simulation by `secs` seconds.
    fn update(&mut self, secs: f32, keys: &Keyboard) -> anyhow::Result<Out>;

    /// Record this frame's draw commands.
    fn draw(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<()>;

    /// Release GPU resources. Must tolerate being called more than once and
    /// after a failed `init()`.
    fn deinit(&mut self, device: &mut dyn RenderDevice);
}

/// Latch making sure the window is asked to close only once.
#[derive(Debug, Default)]
pub struct ExitRequest {
    requested: bool,
}

impl ExitRequest {
    /// Returns `true` the first time only.
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.requested, true)
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }
}

struct App<S: Scene> {
    async_runtime: tokio::runtime::Runtime,
    settings: Settings,
    scene: S,
    ctx: Option<Context>,
    keyboard: Keyboard,
    exit: ExitRequest,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl<S: Scene> App<S> {
    fn new(settings: Settings, scene: S) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            settings,
            scene,
            ctx: None,
            keyboard: Keyboard::new(),
            exit: ExitRequest::default(),
            last_time: Instant::now(),
            error: None,
        })
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit.request() {
            log::info!("Closing window");
            event_loop.exit();
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        if self.error.is_none() {
            self.error = Some(error);
        }
        self.request_exit(event_loop);
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let ctx = self
            .async_runtime
            .block_on(Context::new(window, &self.settings))?;
        let ctx = self.ctx.insert(ctx);

        self.scene.init(ctx)?;
        log::info!("Scene initialised");

        self.last_time = Instant::now();
        ctx.request_redraw();
        Ok(())
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.error.is_some() {
            return;
        }
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        match self.scene.update(dt.as_secs_f32(), &self.keyboard) {
            Ok(Out::Exit) => self.request_exit(event_loop),
            Ok(Out::Empty) => (),
            Err(e) => return self.fail(event_loop, e),
        }

        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        if let Err(e) = self.scene.draw(ctx) {
            return self.fail(event_loop, e);
        }

        match ctx.render() {
            Ok(()) => (),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => ctx.reconfigure(),
            Err(wgpu::SurfaceError::Timeout) => log::warn!("Surface timed out, frame skipped"),
            Err(e) => log::error!("Unable to render {}", e),
        }

        if !self.exit.is_requested() {
            ctx.request_redraw();
        }
    }
}

impl<S: Scene> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            self.fail(event_loop, e.context("App initialization failed"));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
        if self.keyboard.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _: &ActiveEventLoop) {
        if let Some(ctx) = self.ctx.as_mut() {
            self.scene.deinit(ctx);
            log::info!("Scene torn down");
        }
    }
}

/// Open a window and drive `scene` until it is closed.
///
/// Returns the first fatal error raised by the scene or the host, if any.
pub fn run<S: Scene>(settings: Settings, scene: S) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, scene)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
