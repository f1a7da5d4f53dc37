use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraController, Projection},
    data_structures::texture,
    scene::CLEAR_COLOUR,
};

pub const FOVY: f32 = 45.0;
pub const ZNEAR: f32 = 0.1;
pub const ZFAR: f32 = 100.0;

/// Window, GPU device and surface plus the camera state driven by input.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: Camera,
    pub controller: CameraController,
    pub projection: Projection,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter can present to this window")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting a graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let config = surface_config(&surface_caps, size.width, size.height)?;

        let projection = Projection::new(config.width, config.height, cgmath::Deg(FOVY), ZNEAR, ZFAR);

        let depth_texture =
            texture::Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera: Camera::default(),
            controller: CameraController::new(),
            projection,
            clear_colour: CLEAR_COLOUR,
        })
    }

    /// Reconfigure the surface and depth buffer; zero sizes are ignored.
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

/// Pick the surface configuration from what the adapter reports.
///
/// The shaders assume an sRGB surface; other formats come out darker. The
/// first reported present and alpha modes are used.
pub fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    width: u32,
    height: u32,
) -> anyhow::Result<wgpu::SurfaceConfiguration> {
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .or_else(|| caps.formats.first().copied())
        .context("the surface reports no texture formats")?;
    let present_mode = caps
        .present_modes
        .first()
        .copied()
        .context("the surface reports no present modes")?;
    let alpha_mode = caps
        .alpha_modes
        .first()
        .copied()
        .context("the surface reports no alpha modes")?;
    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: vec![
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Bgra8UnormSrgb,
            ],
            present_modes: vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    #[test]
    fn prefers_srgb_and_the_first_modes() {
        let config = surface_config(&caps(), 800, 0).unwrap();
        assert_eq!(config.format, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(config.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(config.alpha_mode, wgpu::CompositeAlphaMode::Opaque);
        assert_eq!((config.width, config.height), (800, 1));
    }

    #[test]
    fn falls_back_to_the_first_format() {
        let mut caps = caps();
        caps.formats = vec![wgpu::TextureFormat::Rgba16Float];
        let config = surface_config(&caps, 1, 1).unwrap();
        assert_eq!(config.format, wgpu::TextureFormat::Rgba16Float);
    }

    #[test]
    fn empty_capability_lists_are_errors() {
        let mut no_present = caps();
        no_present.present_modes.clear();
        let err = surface_config(&no_present, 1, 1).unwrap_err();
        assert!(err.to_string().contains("present modes"), "{}", err);

        let mut no_alpha = caps();
        no_alpha.alpha_modes.clear();
        let err = surface_config(&no_alpha, 1, 1).unwrap_err();
        assert!(err.to_string().contains("alpha modes"), "{}", err);

        // an incompatible surface reports no formats at all
        let err = surface_config(&wgpu::SurfaceCapabilities::default(), 1, 1).unwrap_err();
        assert!(err.to_string().contains("texture formats"), "{}", err);
    }
}
