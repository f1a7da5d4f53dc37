use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

/// Scene light shared by every object, bound at `@group(1)`.
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    rotation: [[f32; 4]; 4],
    position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    color: [f32; 3],
    _padding2: u32,
    view_position: [f32; 3],
    _padding3: u32,
}

impl LightUniform {
    pub fn new(position: Vector3<f32>, color: [f32; 3]) -> Self {
        Self {
            rotation: Matrix4::identity().into(),
            position: position.into(),
            _padding: 0,
            color,
            _padding2: 0,
            view_position: [0.0; 3],
            _padding3: 0,
        }
    }

    pub fn update(&mut self, rotation: Matrix4<f32>, view_position: Point3<f32>) {
        self.rotation = rotation.into();
        self.view_position = view_position.into();
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position.into()
    }

    pub fn view_position(&self) -> Point3<f32> {
        self.view_position.into()
    }

    pub fn rotation(&self) -> Matrix4<f32> {
        self.rotation.into()
    }
}

impl LightResources {
    pub fn new(
        uniform: LightUniform,
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group = mk_bind_group(device, bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}
