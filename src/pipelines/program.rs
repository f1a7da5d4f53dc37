//! Shader programs: a vertex and a fragment WGSL file linked into a pipeline.
//!
//! Every program follows the same binding contract:
//!
//! - `@group(0)`: per-object transforms (`model`, `view`, `projection`)
//! - `@group(1)`: scene light (`rotation`, `position`, `color`, `view_pos`)
//! - `@group(2)`: `main_texture` and its sampler, textured programs only
//!
//! The vertex entry point is `vs_main`, the fragment entry point `fs_main`.

use std::path::Path;

use crate::{
    data_structures::{
        model::{CsvVertex, Vertex},
        texture::Texture,
    },
    error::{ShaderError, ShaderStage},
    resources::load_string,
};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    Textured,
    Untextured,
}

/// Bind group layouts shared by every program built on one device.
#[derive(Debug, Clone)]
pub struct ProgramLayouts {
    pub transforms: wgpu::BindGroupLayout,
    pub light: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
}

impl ProgramLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            transforms: uniform_layout(device, "transforms_bind_group_layout"),
            light: uniform_layout(device, "light_bind_group_layout"),
            texture: texture_layout(device),
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

fn texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("main_texture_bind_group_layout"),
    })
}

#[derive(Debug)]
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    layouts: ProgramLayouts,
    kind: ProgramKind,
}

impl ShaderProgram {
    /// Compile both stages and link them into a render pipeline targeting
    /// `color_format` with depth testing.
    pub async fn build(
        device: &wgpu::Device,
        layouts: &ProgramLayouts,
        color_format: wgpu::TextureFormat,
        vertex_path: &Path,
        fragment_path: &Path,
        kind: ProgramKind,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(device, vertex_path, ShaderStage::Vertex).await?;
        let fragment = compile_stage(device, fragment_path, ShaderStage::Fragment).await?;

        let mut bind_group_layouts = vec![Some(&layouts.transforms), Some(&layouts.light)];
        if kind == ProgramKind::Textured {
            bind_group_layouts.push(Some(&layouts.texture));
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = mk_render_pipeline(
            device,
            &pipeline_layout,
            color_format,
            Some(Texture::DEPTH_FORMAT),
            &[CsvVertex::desc()],
            &vertex,
            &fragment,
        );
        if let Some(error) = scope.pop().await {
            log::error!("shader program linking failed");
            log::error!("wgpu log {:?}", error.to_string());
            return Err(ShaderError::Link {
                log: error.to_string(),
            });
        }

        log::info!(
            "linked {:?} program from {:?} and {:?}",
            kind,
            vertex_path,
            fragment_path
        );
        Ok(Self {
            pipeline,
            layouts: layouts.clone(),
            kind,
        })
    }

    /// Bind for subsequent draws.
    pub fn use_program(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_pipeline(&self.pipeline);
    }

    pub fn layouts(&self) -> &ProgramLayouts {
        &self.layouts
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }
}

async fn compile_stage(
    device: &wgpu::Device,
    path: &Path,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let source = load_string(path).await.map_err(|source| {
        log::error!("could not load shader from {:?}", path);
        ShaderError::Read {
            stage,
            path: path.to_path_buf(),
            source,
        }
    })?;

    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let label = path.to_string_lossy();
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label.as_ref()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let scope_error = scope.pop().await;

    let info = module.get_compilation_info().await;
    let mut diagnostics: Vec<String> = info
        .messages
        .iter()
        .filter(|message| message.message_type == wgpu::CompilationMessageType::Error)
        .map(|message| match &message.location {
            Some(location) => format!(
                "{}:{}: {}",
                location.line_number, location.line_position, message.message
            ),
            None => message.message.clone(),
        })
        .collect();
    if diagnostics.is_empty() {
        if let Some(error) = scope_error {
            diagnostics.push(error.to_string());
        }
    }

    if diagnostics.is_empty() {
        return Ok(module);
    }
    let log = diagnostics.join("\n");
    log::error!("compilation of shader {:?} failed", path);
    log::error!("wgpu log {:?}", log);
    Err(ShaderError::Compile {
        stage,
        path: path.to_path_buf(),
        log,
    })
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: Some(VERTEX_ENTRY),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // vertex files make no promise about winding
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
