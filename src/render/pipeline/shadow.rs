//! Screen-space contact shadow pass
//!
//! Fullscreen pass that ray-marches this frame's depth buffer towards the
//! sun and alpha-blends the resulting occlusion onto the color target. The
//! depth target is bound as a texture here, so the pass itself carries no
//! depth attachment; its bind group is recreated whenever the depth target
//! is, on resize.

use bytemuck::{Pod, Zeroable};

use crate::field::ShadowSettings;
use crate::render::shader;
use crate::render::texture::SAMPLE_COUNT;

/// Ray-march parameters (must match ShadowParams in shadow.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShadowParams {
    pub max_steps: u32,
    pub ray_max_distance: f32,
    pub thickness: f32,
    pub max_depth_delta: f32,
}

impl From<&ShadowSettings> for ShadowParams {
    fn from(settings: &ShadowSettings) -> Self {
        Self {
            max_steps: settings.max_steps,
            ray_max_distance: settings.ray_max_distance,
            thickness: settings.thickness,
            max_depth_delta: settings.max_depth_delta,
        }
    }
}

pub struct ShadowPipeline {
    pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl ShadowPipeline {
    pub fn new(
        device: &wgpu::Device,
        globals_layout: &wgpu::BindGroupLayout,
        depth_view: &wgpu::TextureView,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = shader::module(
            device,
            "shadow_shader",
            include_str!("../../../shaders/shadow.wgsl"),
        );

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow_params"),
            size: std::mem::size_of::<ShadowParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ShadowParams>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: true,
                    },
                    count: None,
                },
            ],
        });
        let bind_group = Self::create_bind_group(device, &layout, &params_buffer, depth_view);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[globals_layout, &layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: SAMPLE_COUNT,
                ..Default::default()
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
            layout,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params_buffer: &wgpu::Buffer,
        depth_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
            ],
        })
    }

    /// Upload new ray-march parameters
    pub fn update_params(&self, queue: &wgpu::Queue, settings: &ShadowSettings) {
        let params = ShadowParams::from(settings);
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Re-bind the depth texture after the targets were resized
    pub fn rebind_depth(&mut self, device: &wgpu::Device, depth_view: &wgpu::TextureView) {
        self.bind_group = Self::create_bind_group(device, &self.layout, &self.params_buffer, depth_view);
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass, globals: &wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, globals, &[]);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_size() {
        // Must match ShadowParams in shadow.wgsl
        assert_eq!(std::mem::size_of::<ShadowParams>(), 16);
    }

    #[test]
    fn test_params_follow_settings() {
        let settings = ShadowSettings {
            max_steps: 16,
            ray_max_distance: 1.5,
            ..Default::default()
        };
        let params = ShadowParams::from(&settings);
        assert_eq!(params.max_steps, 16);
        assert_eq!(params.ray_max_distance, 1.5);
    }
}
