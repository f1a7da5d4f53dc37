//! Render objects: an uploaded vertex file plus the shader and texture it is
//! drawn with.
//!
//! A [`RenderObject`] exclusively owns its vertex data, GPU vertex buffer and
//! transform uniform. Shader programs and textures are shared through `Rc`
//! and outlive any single object that references them.
//!
//! [`RenderObject::take`] hands the owned payload to a new object and leaves
//! the source moved-out. A moved-out object refuses to render.

use std::rc::Rc;

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    error::{ModelError, RenderError},
    pipelines::program::{ProgramKind, ShaderProgram},
    resources::csv::VertexData,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One vertex of the flat buffer produced by [`crate::resources::csv`].
///
/// Only used to describe the layout; the buffer itself is uploaded straight
/// from the parsed floats.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CsvVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub extra: [f32; 3],
}

impl Vertex for CsvVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<CsvVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // opaque per-vertex data; generated face normals land here
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-object matrices, bound at `@group(0)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformsUniform {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl TransformsUniform {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        Self {
            model: model.into(),
            view: view.into(),
            projection: projection.into(),
        }
    }
}

/// Parsed vertices and the static GPU buffer they were uploaded into.
#[derive(Debug)]
pub struct Mesh {
    pub vertices: VertexData,
    pub vertex_buffer: wgpu::Buffer,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, name: &str, vertices: VertexData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices.floats()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertices,
            vertex_buffer,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.vertex_count() as u32
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh, bind_groups: &[&wgpu::BindGroup]);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, bind_groups: &[&wgpu::BindGroup]) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        for (index, group) in bind_groups.iter().enumerate() {
            self.set_bind_group(index as u32, *group, &[]);
        }
        self.draw(0..mesh.vertex_count(), 0..1);
    }
}

#[derive(Debug)]
struct Payload {
    mesh: Mesh,
    shader: Rc<ShaderProgram>,
    texture: Option<Rc<Texture>>,
    transforms: wgpu::Buffer,
    transforms_bind_group: wgpu::BindGroup,
    texture_bind_group: Option<wgpu::BindGroup>,
}

#[derive(Debug)]
pub struct RenderObject {
    name: String,
    payload: Option<Payload>,
}

impl RenderObject {
    /// Upload `vertices` once and bind them to `shader` (and `texture`, which
    /// must be present exactly when the program is textured).
    pub fn new(
        device: &wgpu::Device,
        name: String,
        vertices: VertexData,
        shader: Rc<ShaderProgram>,
        texture: Option<Rc<Texture>>,
    ) -> Result<Self, ModelError> {
        let textured = shader.kind() == ProgramKind::Textured;
        if textured != texture.is_some() {
            log::error!("model {:?} does not match its program's texture slot", name);
            return Err(ModelError::TextureBinding { model: name });
        }

        let layouts = shader.layouts();
        let mesh = Mesh::upload(device, &name, vertices);

        let transforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{:?} Transforms Buffer", name)),
            size: std::mem::size_of::<TransformsUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let transforms_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.transforms,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transforms.as_entire_binding(),
            }],
            label: Some("transforms_bind_group"),
        });
        let texture_bind_group = texture
            .as_ref()
            .map(|texture| texture.bind_group(device, &layouts.texture));

        log::info!("loaded object {} ({} vertices)", name, mesh.vertex_count());
        Ok(Self {
            name,
            payload: Some(Payload {
                mesh,
                shader,
                texture,
                transforms,
                transforms_bind_group,
                texture_bind_group,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_moved(&self) -> bool {
        self.payload.is_none()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.payload.as_ref().map(|payload| &payload.mesh)
    }

    pub fn shader(&self) -> Option<&Rc<ShaderProgram>> {
        self.payload.as_ref().map(|payload| &payload.shader)
    }

    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.payload.as_ref().and_then(|payload| payload.texture.as_ref())
    }

    /// Move everything this object owns into the returned object.
    pub fn take(&mut self) -> RenderObject {
        RenderObject {
            name: self.name.clone(),
            payload: self.payload.take(),
        }
    }

    /// Write the matrices and record a draw of the whole vertex buffer with
    /// this object's program.
    pub fn render(
        &self,
        queue: &wgpu::Queue,
        render_pass: &mut wgpu::RenderPass<'_>,
        light: &wgpu::BindGroup,
        model: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
    ) -> Result<(), RenderError> {
        let payload = self.payload.as_ref().ok_or_else(|| RenderError::UseAfterMove {
            name: self.name.clone(),
        })?;
        if payload.mesh.vertices.is_empty() {
            log::warn!("{} has no vertices to draw", self.name);
            return Ok(());
        }

        let transforms = TransformsUniform::new(model, view, projection);
        queue.write_buffer(&payload.transforms, 0, bytemuck::cast_slice(&[transforms]));

        payload.shader.use_program(render_pass);
        let mut bind_groups = vec![&payload.transforms_bind_group, light];
        bind_groups.extend(payload.texture_bind_group.as_ref());
        render_pass.draw_mesh(&payload.mesh, &bind_groups);
        Ok(())
    }
}
