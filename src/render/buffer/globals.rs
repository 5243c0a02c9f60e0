//! Per-frame global uniform buffer (camera + lighting + time)

use bytemuck::{Pod, Zeroable};

use crate::core::camera::Camera;
use crate::field::LightSettings;

/// Camera matrices and pose (must match CameraBlock in common.wgsl)
///
/// WGSL vec3 has 16-byte alignment, so explicit padding is load-bearing.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraBlock {
    /// View matrix (64 bytes, offset 0)
    pub view: [[f32; 4]; 4],
    /// Projection matrix (64 bytes, offset 64)
    pub proj: [[f32; 4]; 4],
    /// Inverse view matrix (64 bytes, offset 128)
    pub view_inv: [[f32; 4]; 4],
    /// Inverse projection matrix (64 bytes, offset 192)
    pub proj_inv: [[f32; 4]; 4],
    /// Camera world position (offset 256)
    pub position: [f32; 3],
    pub _pad0: f32,
    /// Camera world direction (offset 272)
    pub direction: [f32; 3],
    pub _pad1: f32,
}

/// Sky and sun parameters (must match LightBlock in common.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightBlock {
    pub sky_up_color: [f32; 3],
    pub _pad0: f32,
    pub sky_ground_color: [f32; 3],
    pub _pad1: f32,
    pub sun_color: [f32; 3],
    pub _pad2: f32,
    pub sun_direction: [f32; 3],
    pub _pad3: f32,
}

impl From<&LightSettings> for LightBlock {
    fn from(light: &LightSettings) -> Self {
        Self {
            sky_up_color: light.sky_up_color.to_array(),
            _pad0: 0.0,
            sky_ground_color: light.sky_ground_color.to_array(),
            _pad1: 0.0,
            sun_color: light.sun_color.to_array(),
            _pad2: 0.0,
            sun_direction: light.sun_direction.normalize_or_zero().to_array(),
            _pad3: 0.0,
        }
    }
}

/// The one packed struct every pass reads (must match common.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUniforms {
    pub camera: CameraBlock,
    pub light: LightBlock,
    pub time: f32,
    pub frame: u32,
    pub _pad: [f32; 2],
}

impl GlobalUniforms {
    /// Build the frame's uniform data from the camera pose and lighting
    pub fn new(camera: &Camera, light: &LightSettings, time: f32, frame: u32) -> Self {
        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        Self {
            camera: CameraBlock {
                view: view.to_cols_array_2d(),
                proj: proj.to_cols_array_2d(),
                view_inv: view.inverse().to_cols_array_2d(),
                proj_inv: proj.inverse().to_cols_array_2d(),
                position: camera.position.to_array(),
                _pad0: 0.0,
                direction: camera.forward().to_array(),
                _pad1: 0.0,
            },
            light: LightBlock::from(light),
            time,
            frame,
            _pad: [0.0; 2],
        }
    }
}

/// GPU buffer for the global uniforms, with its bind group shared by every
/// pipeline as group 0
pub struct GlobalsBuffer {
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalsBuffer {
    /// Create the buffer, layout and bind group
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global_uniforms"),
            size: std::mem::size_of::<GlobalUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GlobalUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Upload this frame's values; must happen before any pass reads them
    pub fn update(
        &self,
        queue: &wgpu::Queue,
        camera: &Camera,
        light: &LightSettings,
        time: f32,
        frame: u32,
    ) {
        let uniforms = GlobalUniforms::new(camera, light, time, frame);
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Get bind group layout
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Get bind group
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes() {
        // Must match the WGSL struct layouts exactly
        assert_eq!(std::mem::size_of::<CameraBlock>(), 288);
        assert_eq!(std::mem::size_of::<LightBlock>(), 64);
        assert_eq!(std::mem::size_of::<GlobalUniforms>(), 368);
    }

    #[test]
    fn test_sun_direction_normalized_on_upload() {
        let light = LightSettings {
            sun_direction: Vec3::new(0.0, 10.0, 0.0),
            ..Default::default()
        };
        let block = LightBlock::from(&light);
        assert!((block.sun_direction[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_matrices_roundtrip() {
        let camera = Camera::default();
        let uniforms =
            GlobalUniforms::new(&camera, &LightSettings::default(), 0.0, 0);
        let proj = glam::Mat4::from_cols_array_2d(&uniforms.camera.proj);
        let proj_inv = glam::Mat4::from_cols_array_2d(&uniforms.camera.proj_inv);
        let identity = proj * proj_inv;
        assert!((identity.w_axis.w - 1.0).abs() < 1e-4);
    }
}
