//! Blade instance generation and movement compute pipelines.
//!
//! `BladeCompute` owns the shared blade-instance storage buffer. The
//! generation pass fills it from field settings, the movement pass re-bends
//! the curve control points in place every frame. The buffer is the single
//! source of truth; no CPU mirror is kept.

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;
use crate::field::{FieldSettings, WindSettings};
use crate::render::shader;

/// One grass blade's GPU-resident attributes (must match common.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BladeInstance {
    /// Base position on the field plane
    pub position: [f32; 3],
    /// Per-blade identity hash in [0, 1)
    pub hash: f32,
    /// Grid coordinate within the field, normalized
    pub uv: [f32; 2],
    /// World-space blade height
    pub height: f32,
    /// Height relative to the noise range, in [0, 1]
    pub relative_height: f32,
    /// First curve control point (w unused)
    pub c1: [f32; 4],
    /// Second curve control point / tip (w unused)
    pub c2: [f32; 4],
    /// Facing direction in the XZ plane
    pub facing: [f32; 3],
    /// Rest lean strength
    pub bend: f32,
}

/// Generation parameters (must match GenParams in grass_gen.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GenParams {
    pub side_length: f32,
    pub density: f32,
    pub max_position_jitter: f32,
    pub height_noise_frequency: f32,
    pub blade_height: f32,
    pub height_noise_amplitude: f32,
    pub blades_per_side: f32,
    pub _pad: f32,
}

impl From<&FieldSettings> for GenParams {
    fn from(settings: &FieldSettings) -> Self {
        Self {
            side_length: settings.side_length,
            density: settings.density,
            max_position_jitter: settings.max_position_jitter(),
            height_noise_frequency: settings.height_noise_frequency,
            blade_height: settings.blade_height,
            height_noise_amplitude: settings.height_noise_amplitude,
            blades_per_side: settings.blades_per_side() as f32,
            _pad: 0.0,
        }
    }
}

/// Wind parameters (must match WindParams in grass_move.wgsl)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct WindParams {
    /// direction.xyz + strength in w
    pub wind: [f32; 4],
    pub frequency: f32,
    pub _pad: [f32; 3],
}

impl From<&WindSettings> for WindParams {
    fn from(wind: &WindSettings) -> Self {
        Self {
            wind: [
                wind.direction.x,
                wind.direction.y,
                wind.direction.z,
                wind.strength,
            ],
            frequency: wind.frequency,
            _pad: [0.0; 3],
        }
    }
}

/// Reference implementation of the movement kernel's sway term, kept in
/// sync with grass_move.wgsl.
pub fn sway_amount(strength: f32, frequency: f32, time: f32, phase: f32) -> f32 {
    strength * (std::f32::consts::TAU * frequency * time + phase).sin()
}

/// Reference implementation of the generation kernel's per-blade hash,
/// kept in sync with hash2 in grass_gen.wgsl. Pure function of the grid
/// coordinate, so regeneration is deterministic.
pub fn blade_hash(i: u32, j: u32) -> f32 {
    let h = i as f32 * 127.1 + j as f32 * 311.7;
    let v = h.sin() * 43758.5453123;
    // WGSL fract(), not Rust's signed fract
    v - v.floor()
}

/// Owns the blade instance buffer and the generation/movement pipelines
pub struct BladeCompute {
    blade_buffer: wgpu::Buffer,
    blade_count: u32,
    blades_per_side: u32,

    shared_layout: wgpu::BindGroupLayout,
    shared_bind_group: wgpu::BindGroup,

    gen_pipeline: wgpu::ComputePipeline,
    gen_params_buffer: wgpu::Buffer,
    gen_bind_group: wgpu::BindGroup,

    move_pipeline: wgpu::ComputePipeline,
    wind_buffer: wgpu::Buffer,
    time_buffer: wgpu::Buffer,
    move_bind_group: wgpu::BindGroup,
}

impl BladeCompute {
    /// Byte size of the storage buffer for a given settings snapshot
    pub fn buffer_size(settings: &FieldSettings) -> u64 {
        settings.total_blades() as u64 * std::mem::size_of::<BladeInstance>() as u64
    }

    /// Allocate the blade buffer and build both compute pipelines
    pub fn new(device: &wgpu::Device, settings: &FieldSettings) -> Self {
        let blade_buffer = Self::create_blade_buffer(device, settings);

        // min_binding_size covers one element; the buffer itself is a
        // runtime-sized array, so pipelines survive a rebuild at a
        // different blade count.
        let shared_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blade_storage_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<BladeInstance>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let shared_bind_group = Self::create_shared_bind_group(device, &shared_layout, &blade_buffer);

        // Generation pipeline
        let gen_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_gen_params"),
            size: std::mem::size_of::<GenParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let gen_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_gen_params_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<GenParams>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let gen_shader = shader::module(
            device,
            "grass_gen_shader",
            include_str!("../../../shaders/grass_gen.wgsl"),
        );
        let gen_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_gen_pipeline_layout"),
            bind_group_layouts: &[&shared_layout, &gen_layout],
            immediate_size: 0,
        });
        let gen_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("grass_gen_pipeline"),
            layout: Some(&gen_pipeline_layout),
            module: &gen_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let gen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_gen_bind_group"),
            layout: &gen_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: gen_params_buffer.as_entire_binding(),
            }],
        });

        // Movement pipeline
        let wind_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_wind_params"),
            size: std::mem::size_of::<WindParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let time_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_time"),
            size: std::mem::size_of::<f32>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let move_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_move_params_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<WindParams>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<f32>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let move_shader = shader::module(
            device,
            "grass_move_shader",
            include_str!("../../../shaders/grass_move.wgsl"),
        );
        let move_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grass_move_pipeline_layout"),
            bind_group_layouts: &[&shared_layout, &move_layout],
            immediate_size: 0,
        });
        let move_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("grass_move_pipeline"),
            layout: Some(&move_pipeline_layout),
            module: &move_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let move_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_move_bind_group"),
            layout: &move_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wind_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: time_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!(
            "blade buffer: {} instances, {} bytes",
            settings.total_blades(),
            Self::buffer_size(settings)
        );

        Self {
            blade_buffer,
            blade_count: settings.total_blades(),
            blades_per_side: settings.blades_per_side(),
            shared_layout,
            shared_bind_group,
            gen_pipeline,
            gen_params_buffer,
            gen_bind_group,
            move_pipeline,
            wind_buffer,
            time_buffer,
            move_bind_group,
        }
    }

    fn create_blade_buffer(device: &wgpu::Device, settings: &FieldSettings) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blade_instances"),
            size: Self::buffer_size(settings),
            // COPY_SRC only serves the debug readback path
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn create_shared_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blade_storage_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    /// Upload generation parameters and dispatch the generation pass.
    ///
    /// Idempotent: the kernel is a pure function of the grid coordinate, so
    /// regenerating with unchanged settings overwrites the buffer with
    /// identical contents.
    pub fn generate(&self, device: &wgpu::Device, queue: &wgpu::Queue, settings: &FieldSettings) {
        debug_assert_eq!(settings.total_blades(), self.blade_count,
            "settings changed blade count; call rebuild instead of generate");

        let params = GenParams::from(settings);
        queue.write_buffer(&self.gen_params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("grass_gen_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("grass_gen_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.gen_pipeline);
            pass.set_bind_group(0, &self.shared_bind_group, &[]);
            pass.set_bind_group(1, &self.gen_bind_group, &[]);
            pass.dispatch_workgroups(self.blades_per_side, self.blades_per_side, 1);
        }
        queue.submit(Some(encoder.finish()));
    }

    /// Upload wind parameters only; no dispatch
    pub fn update_wind(&self, queue: &wgpu::Queue, wind: &WindSettings) {
        let params = WindParams::from(wind);
        queue.write_buffer(&self.wind_buffer, 0, bytemuck::bytes_of(&params));
    }

    /// Upload the time scalar and dispatch the movement pass.
    ///
    /// In-place read-modify-write on the blade buffer. Safe because each
    /// invocation owns exactly one disjoint array element, and submissions
    /// on one queue execute in order relative to the render passes that
    /// read the buffer afterwards.
    pub fn compute_movement(&self, device: &wgpu::Device, queue: &wgpu::Queue, time: f32) {
        queue.write_buffer(&self.time_buffer, 0, bytemuck::bytes_of(&time));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("grass_move_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("grass_move_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.move_pipeline);
            pass.set_bind_group(0, &self.shared_bind_group, &[]);
            pass.set_bind_group(1, &self.move_bind_group, &[]);
            pass.dispatch_workgroups(self.blades_per_side, self.blades_per_side, 1);
        }
        queue.submit(Some(encoder.finish()));
    }

    /// Reallocate the blade buffer after a density/side-length change and
    /// regenerate. The renderer must re-bind via
    /// `GrassPipeline::rebind_blades` afterwards.
    pub fn rebuild(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, settings: &FieldSettings) {
        self.blade_buffer = Self::create_blade_buffer(device, settings);
        self.shared_bind_group =
            Self::create_shared_bind_group(device, &self.shared_layout, &self.blade_buffer);
        self.blade_count = settings.total_blades();
        self.blades_per_side = settings.blades_per_side();

        log::info!(
            "blade buffer rebuilt: {} instances, {} bytes",
            self.blade_count,
            Self::buffer_size(settings)
        );
        self.generate(device, queue, settings);
    }

    /// The shared storage buffer, for the renderer to bind read-only
    pub fn blade_buffer(&self) -> &wgpu::Buffer {
        &self.blade_buffer
    }

    /// Number of instances in the buffer
    pub fn blade_count(&self) -> u32 {
        self.blade_count
    }

    /// Debug-only readback of the full blade buffer. Blocks on the mapped
    /// buffer future; keep off the hot path.
    pub fn read_back_blades(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<BladeInstance>, Error> {
        let size = self.blade_buffer.size();
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("blade_readback_staging"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("blade_readback_encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.blade_buffer, 0, &staging, 0, size);
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        });

        rx.recv()
            .map_err(|_| Error::Gpu("blade readback channel disconnected".into()))?
            .map_err(|e| Error::Gpu(format!("blade readback map failed: {e:?}")))?;

        let data = slice.get_mapped_range();
        let blades = bytemuck::cast_slice::<u8, BladeInstance>(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(blades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_blade_instance_size() {
        // Must match the WGSL BladeInstance layout: 20 floats
        assert_eq!(std::mem::size_of::<BladeInstance>(), 80);
    }

    #[test]
    fn test_buffer_size_roundtrip() {
        let settings = FieldSettings::default();
        assert_eq!(
            BladeCompute::buffer_size(&settings),
            settings.total_blades() as u64 * 80
        );
    }

    #[test]
    fn test_param_struct_sizes() {
        assert_eq!(std::mem::size_of::<GenParams>(), 32);
        assert_eq!(std::mem::size_of::<WindParams>(), 32);
    }

    #[test]
    fn test_wind_packing() {
        let wind = WindSettings {
            direction: Vec3::new(0.8, 0.0, -0.5),
            strength: 0.75,
            frequency: 0.8,
        };
        let params = WindParams::from(&wind);
        assert_eq!(params.wind, [0.8, 0.0, -0.5, 0.75]);
        assert_eq!(params.frequency, 0.8);
    }

    #[test]
    fn test_zero_strength_sway_is_no_op() {
        for time in [0.0, 0.37, 12.5, 10_000.0] {
            assert_eq!(sway_amount(0.0, 0.8, time, 1.3), 0.0);
        }
    }

    #[test]
    fn test_blade_hash_is_deterministic_and_bounded() {
        for i in 0..64u32 {
            for j in 0..64u32 {
                let h = blade_hash(i, j);
                assert!((0.0..1.0).contains(&h), "hash out of range at ({i}, {j}): {h}");
                assert_eq!(h, blade_hash(i, j));
            }
        }
        // Neighbors decorrelate
        assert_ne!(blade_hash(3, 5), blade_hash(4, 5));
    }

    #[test]
    fn test_sway_periodicity() {
        let (strength, frequency, phase) = (1.0, 0.8, 2.1);
        let t1 = 3.7;
        let t2 = t1 + 1.0 / frequency;
        let a = sway_amount(strength, frequency, t1, phase);
        let b = sway_amount(strength, frequency, t2, phase);
        assert!((a - b).abs() < 1e-4, "one period apart: {a} vs {b}");
    }
}
