use std::path::{Path, PathBuf};

use flyby::{
    data_structures::texture::Texture,
    pipelines::{
        light::{LightResources, LightUniform},
        program::ProgramLayouts,
    },
    scene::{CLEAR_COLOUR, LIGHT_COLOR, LIGHT_POSITION},
};

/// Side length of the offscreen target. 64 RGBA pixels fill exactly one
/// 256 byte row, so readback needs no row padding.
pub const SIZE: u32 = 64;
pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub layouts: ProgramLayouts,
    pub light: LightResources,
}

impl Gpu {
    /// Device without a window or surface.
    pub async fn headless() -> Self {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("no graphics adapter available for integration tests");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("test device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("failed to create a test device");
        let layouts = ProgramLayouts::new(&device);
        let light = LightResources::new(
            LightUniform::new(LIGHT_POSITION, LIGHT_COLOR),
            &device,
            &layouts.light,
        );
        Self {
            device,
            queue,
            layouts,
            light,
        }
    }

    pub fn target(&self) -> Target {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = Texture::create_depth_texture(&self.device, [SIZE, SIZE], "test_depth_texture");
        Target {
            texture,
            view,
            depth,
        }
    }

    /// Clear `target` to the scene clear colour, record `draw` into one
    /// render pass and submit it.
    pub fn render<R>(&self, target: &Target, draw: impl FnOnce(&mut wgpu::RenderPass<'_>) -> R) -> R {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Test Encoder"),
            });
        let result = {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Test Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOUR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            draw(&mut render_pass)
        };
        self.queue.submit(std::iter::once(encoder.finish()));
        result
    }

    /// Copy the target back to the CPU as RGBA rows.
    pub async fn read_pixels(&self, target: &Target) -> Vec<[u8; 4]> {
        let u32_size = std::mem::size_of::<u32>() as u32;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (u32_size * SIZE * SIZE) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("Test Readback Buffer"),
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(u32_size * SIZE),
                    rows_per_image: Some(SIZE),
                },
            },
            extent(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        // The mapping has to be requested before polling the device.
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .unwrap();
        rx.receive().await.unwrap().unwrap();

        let pixels = buffer_slice
            .get_mapped_range()
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .collect();
        output_buffer.unmap();
        pixels
    }
}

pub struct Target {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub depth: Texture,
}

fn extent() -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: SIZE,
        height: SIZE,
        depth_or_array_layers: 1,
    }
}

pub fn demo_path(relative: impl AsRef<Path>) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demo").join(relative)
}

pub fn shader_path(name: &str) -> PathBuf {
    demo_path("shaders").join(name)
}

pub fn resource_path(name: &str) -> PathBuf {
    demo_path("res").join(name)
}
