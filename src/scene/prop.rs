//! Scene props: a mesh, a material and a model matrix

use glam::Mat4;

use crate::render::pipeline::ScenePipeline;
use crate::render::texture::Texture;
use crate::scene::mesh::{Mesh, MeshGeometry};

pub struct Prop {
    mesh: Mesh,
    #[allow(dead_code)]
    texture: Texture,
    material_bind_group: wgpu::BindGroup,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
}

impl Prop {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &ScenePipeline,
        geometry: &MeshGeometry,
        texture: Texture,
        model: Mat4,
    ) -> Self {
        let mesh = Mesh::new(device, queue, geometry);
        let material_bind_group = pipeline.create_material_bind_group(device, &texture);

        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prop_model_matrix"),
            size: std::mem::size_of::<Mat4>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&model_buffer, 0, bytemuck::bytes_of(&model.to_cols_array_2d()));
        let model_bind_group = pipeline.create_model_bind_group(device, &model_buffer);

        Self {
            mesh,
            texture,
            material_bind_group,
            model_buffer,
            model_bind_group,
        }
    }

    /// Move or rescale the prop
    pub fn set_model(&self, queue: &wgpu::Queue, model: Mat4) {
        queue.write_buffer(&self.model_buffer, 0, bytemuck::bytes_of(&model.to_cols_array_2d()));
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material_bind_group(&self) -> &wgpu::BindGroup {
        &self.material_bind_group
    }

    pub fn model_bind_group(&self) -> &wgpu::BindGroup {
        &self.model_bind_group
    }
}
