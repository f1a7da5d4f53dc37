//! Application event loop.
//!
//! [`run`] opens the window, loads the whole scene before the first frame and
//! then redraws continuously until the window is closed or the quit key is
//! pressed.
//!
//! # Lifecycle
//!
//! Each frame:
//! 1. Collect window events; bound keys update the [`CameraController`]
//! 2. Apply every held key to the camera once
//! 3. Update the light and draw the scene into the surface
//! 4. Present the frame and request the next redraw
//!
//! Any startup failure stops the event loop and is returned from [`run`].
//!
//! [`CameraController`]: crate::camera::CameraController

use std::{iter, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::Context,
    error::FrameError,
    resources::csv::NormalMode,
    scene::Scene,
    settings::load_settings,
};

pub const WINDOW_TITLE: &str = "flyby";
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Startup choices made on the command line.
#[derive(Debug, Clone)]
pub struct Options {
    pub settings: PathBuf,
    pub mode: NormalMode,
    pub spin: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            settings: PathBuf::from("settings.json"),
            mode: NormalMode::default(),
            spin: false,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// GPU context and the loaded scene, alive while the window is.
pub struct AppState {
    pub(crate) ctx: Context,
    scene: Scene,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, options: &Options) -> anyhow::Result<Self> {
        let settings = load_settings(&options.settings)
            .await
            .with_context(|| format!("loading settings from {:?}", options.settings))?;
        let ctx = Context::new(window)
            .await
            .context("creating the GPU context")?;
        let scene = Scene::new(
            &ctx.device,
            &ctx.queue,
            ctx.config.format,
            &settings,
            options.mode,
            options.spin,
        )
        .await?;

        let mut state = Self {
            ctx,
            scene,
            is_surface_configured: false,
        };
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);
        Ok(state)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self, seconds: f32) -> Result<(), FrameError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let (output, suboptimal) = match acquire_frame(self.ctx.surface.get_current_texture())? {
            Some(frame) => frame,
            None => return Ok(()),
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
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            self.scene.render(
                &self.ctx.queue,
                &mut render_pass,
                &self.ctx.camera,
                &self.ctx.projection,
                seconds,
            )?;
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();

        if suboptimal {
            log::debug!("surface is suboptimal, reconfiguring");
            let (width, height) = (self.ctx.config.width, self.ctx.config.height);
            self.resize(width, height);
        }
        Ok(())
    }
}

/// Sort the surface's answer into a frame to draw, a frame to skip or an
/// error. The flag is set when the texture no longer matches the surface.
fn acquire_frame(
    current: wgpu::CurrentSurfaceTexture,
) -> Result<Option<(wgpu::SurfaceTexture, bool)>, FrameError> {
    match current {
        wgpu::CurrentSurfaceTexture::Success(texture) => Ok(Some((texture, false))),
        wgpu::CurrentSurfaceTexture::Suboptimal(texture) => Ok(Some((texture, true))),
        wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => Ok(None),
        wgpu::CurrentSurfaceTexture::Outdated => Err(FrameError::SurfaceOutdated),
        wgpu::CurrentSurfaceTexture::Lost => Err(FrameError::SurfaceLost),
        wgpu::CurrentSurfaceTexture::Validation => Err(FrameError::SurfaceValidation),
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    options: Options,
    state: Option<AppState>,
    started: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(options: Options) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("starting the async runtime")?;
        Ok(Self {
            async_runtime,
            options,
            state: None,
            started: Instant::now(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.options.width, self.options.height));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e).context("opening the window")),
        };

        match self
            .async_runtime
            .block_on(AppState::new(window, &self.options))
        {
            Ok(state) => {
                self.started = Instant::now();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        if state.ctx.controller.handle_window_events(&event) && state.ctx.controller.quit_requested() {
            log::info!("quit key pressed");
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                state.ctx.controller.update_camera(&mut state.ctx.camera);
                let seconds = self.started.elapsed().as_secs_f32();

                match state.render(seconds) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(e) if e.needs_reconfigure() => {
                        log::warn!("{}, reconfiguring", e);
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(FrameError::Render(e)) => {
                        self.fail(event_loop, e.into());
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

/// Open the viewer window and block until it is closed.
pub fn run(options: Options) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(options)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
