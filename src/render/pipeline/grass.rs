//! Instanced grass blade pass
//!
//! Draws one blade mesh per instance, pulling per-blade data from the
//! compute-filled storage buffer. Group 1 holds the shading parameters and
//! normal map, group 2 the blade storage buffer so it can be re-bound when
//! the field is rebuilt at a different blade count.

use bytemuck::{Pod, Zeroable};

use crate::field::BladeAppearance;
use crate::render::compute::BladeInstance;
use crate::render::shader;
use crate::render::texture::{Texture, DEPTH_FORMAT, SAMPLE_COUNT};
use crate::scene::mesh::Vertex;

/// Blade shading parameters (must match BladeParams in grass.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BladeShadingParams {
    pub short_color: [f32; 3],
    pub ambient_strength: f32,
    pub tall_color: [f32; 3],
    pub wrap: f32,
    pub specular_color: [f32; 3],
    pub specular_strength: f32,
    pub diffuse_strength: f32,
    pub shadows: f32,
    pub _pad: [f32; 2],
}

impl From<&BladeAppearance> for BladeShadingParams {
    fn from(appearance: &BladeAppearance) -> Self {
        Self {
            short_color: appearance.short_color.to_array(),
            ambient_strength: appearance.ambient_strength,
            tall_color: appearance.tall_color.to_array(),
            wrap: appearance.wrap,
            specular_color: appearance.specular_color.to_array(),
            specular_strength: appearance.specular_strength,
            diffuse_strength: appearance.diffuse_strength,
            shadows: appearance.shadows,
            _pad: [0.0; 2],
        }
    }
}

pub struct GrassPipeline {
    pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    shading_layout: wgpu::BindGroupLayout,
    shading_bind_group: wgpu::BindGroup,
    blade_layout: wgpu::BindGroupLayout,
    blade_bind_group: wgpu::BindGroup,
    normal_sampler: wgpu::Sampler,
}

impl GrassPipeline {
    pub fn new(
        device: &wgpu::Device,
        globals_layout: &wgpu::BindGroupLayout,
        normal_map: &Texture,
        blade_buffer: &wgpu::Buffer,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shader::module(
            device,
            "grass_shader",
            include_str!("../../../shaders/grass.wgsl"),
        );

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blade_shading_params"),
            size: std::mem::size_of::<BladeShadingParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let normal_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grass_normal_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let shading_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_shading_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<BladeShadingParams>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let shading_bind_group = Self::create_shading_bind_group(
            device,
            &shading_layout,
            &params_buffer,
            normal_map,
            &normal_sampler,
        );

        // Read-only view of the blade storage; min_binding_size covers one
        // element so the pipeline survives a buffer rebuild.
        let blade_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_blade_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<BladeInstance>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let blade_bind_group = Self::create_blade_bind_group(device, &blade_layout, blade_buffer);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_pipeline_layout"),
            bind_group_layouts: &[globals_layout, &shading_layout, &blade_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grass_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Thin quads, shaded two-sided in the fragment stage
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: SAMPLE_COUNT,
                ..Default::default()
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            params_buffer,
            shading_layout,
            shading_bind_group,
            blade_layout,
            blade_bind_group,
            normal_sampler,
        }
    }

    fn create_shading_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params_buffer: &wgpu::Buffer,
        normal_map: &Texture,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_shading_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&normal_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_blade_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        blade_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_blade_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: blade_buffer.as_entire_binding(),
            }],
        })
    }

    /// Upload new shading parameters
    pub fn update_params(&self, queue: &wgpu::Queue, appearance: &BladeAppearance) {
        let params = BladeShadingParams::from(appearance);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Swap the normal map; recreates the shading bind group
    pub fn set_normal_map(&mut self, device: &wgpu::Device, normal_map: &Texture) {
        self.shading_bind_group = Self::create_shading_bind_group(
            device,
            &self.shading_layout,
            &self.params_buffer,
            normal_map,
            &self.normal_sampler,
        );
    }

    /// Re-bind the blade storage after a field rebuild replaced the buffer
    pub fn rebind_blades(&mut self, device: &wgpu::Device, blade_buffer: &wgpu::Buffer) {
        self.blade_bind_group = Self::create_blade_bind_group(device, &self.blade_layout, blade_buffer);
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass,
        globals: &wgpu::BindGroup,
        blade_mesh: &crate::scene::mesh::Mesh,
        instance_count: u32,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_bind_group(1, &self.shading_bind_group, &[]);
        pass.set_bind_group(2, &self.blade_bind_group, &[]);
        pass.set_vertex_buffer(0, blade_mesh.vertex_buffer().slice(..));
        pass.set_index_buffer(blade_mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..blade_mesh.index_count(), 0, 0..instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_shading_params_size() {
        // Must match BladeParams in grass.wgsl
        assert_eq!(std::mem::size_of::<BladeShadingParams>(), 64);
    }

    #[test]
    fn test_shading_params_follow_appearance() {
        let appearance = BladeAppearance {
            short_color: Vec3::new(0.1, 0.2, 0.3),
            wrap: 0.5,
            ..Default::default()
        };
        let params = BladeShadingParams::from(&appearance);
        assert_eq!(params.short_color, [0.1, 0.2, 0.3]);
        assert_eq!(params.wrap, 0.5);
    }
}
