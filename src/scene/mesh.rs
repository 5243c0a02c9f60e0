//! Mesh geometry: procedural blade and ground shapes, plus OBJ loading

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;

/// Vertex format shared by the grass and scene pipelines
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// CPU-side mesh data, indexed triangle list
#[derive(Clone, Debug, Default)]
pub struct MeshGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Tapered blade silhouette: x spans the width, y runs 0..1 root to
    /// tip. The grass vertex stage bends this along the blade's curve.
    pub fn blade(segments: u32, width: f32) -> Self {
        let segments = segments.max(1);
        let half = width * 0.5;
        let mut vertices = Vec::with_capacity(segments as usize * 2 + 1);
        let mut indices = Vec::with_capacity(segments as usize * 6);

        for i in 0..segments {
            let t = i as f32 / segments as f32;
            // Narrow towards the tip
            let w = half * (1.0 - t * t);
            vertices.push(Vertex {
                position: [-w, t, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [0.0, t],
            });
            vertices.push(Vertex {
                position: [w, t, 0.0],
                normal: [0.0, 0.0, 1.0],
                uv: [1.0, t],
            });
        }
        // Single tip vertex
        let tip = vertices.len() as u32;
        vertices.push(Vertex {
            position: [0.0, 1.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.5, 1.0],
        });

        for i in 0..segments - 1 {
            let base = i * 2;
            indices.extend_from_slice(&[base, base + 1, base + 2]);
            indices.extend_from_slice(&[base + 1, base + 3, base + 2]);
        }
        let last = (segments - 1) * 2;
        indices.extend_from_slice(&[last, last + 1, tip]);

        Self { vertices, indices }
    }

    /// Flat ground quad centered on the origin, normal up
    pub fn ground_quad(half_extent: f32) -> Self {
        let h = half_extent;
        let vertices = vec![
            Vertex { position: [-h, 0.0, -h], normal: [0.0, 1.0, 0.0], uv: [0.0, 0.0] },
            Vertex { position: [-h, 0.0, h], normal: [0.0, 1.0, 0.0], uv: [0.0, 1.0] },
            Vertex { position: [h, 0.0, h], normal: [0.0, 1.0, 0.0], uv: [1.0, 1.0] },
            Vertex { position: [h, 0.0, -h], normal: [0.0, 1.0, 0.0], uv: [1.0, 0.0] },
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Self { vertices, indices }
    }

    /// Load every model from an OBJ file as one geometry per mesh
    pub fn from_obj(path: &Path) -> Result<Vec<Self>, Error> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| Error::Asset(format!("failed to load {}: {e}", path.display())))?;

        let mut geometries = Vec::with_capacity(models.len());
        for model in models {
            let mesh = model.mesh;
            let vertex_count = mesh.positions.len() / 3;
            let mut vertices = Vec::with_capacity(vertex_count);
            for i in 0..vertex_count {
                let normal = if mesh.normals.len() >= (i + 1) * 3 {
                    [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
                } else {
                    [0.0, 1.0, 0.0]
                };
                let uv = if mesh.texcoords.len() >= (i + 1) * 2 {
                    [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };
                vertices.push(Vertex {
                    position: [
                        mesh.positions[i * 3],
                        mesh.positions[i * 3 + 1],
                        mesh.positions[i * 3 + 2],
                    ],
                    normal,
                    uv,
                });
            }
            geometries.push(Self {
                vertices,
                indices: mesh.indices,
            });
        }
        Ok(geometries)
    }
}

/// GPU-resident mesh
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, geometry: &MeshGeometry) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_vertices"),
            size: (geometry.vertices.len() * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&geometry.vertices));

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_indices"),
            size: (geometry.indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&geometry.indices));

        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        }
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_blade_spans_root_to_tip() {
        let blade = MeshGeometry::blade(4, 0.1);
        let min_y = blade.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = blade.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert_eq!(min_y, 0.0);
        assert_eq!(max_y, 1.0);
        // Indexed triangle list
        assert_eq!(blade.indices.len() % 3, 0);
        let max_index = *blade.indices.iter().max().unwrap() as usize;
        assert!(max_index < blade.vertices.len());
    }

    #[test]
    fn test_blade_tapers_to_a_point() {
        let blade = MeshGeometry::blade(6, 0.1);
        let tip = blade.vertices.last().unwrap();
        assert_eq!(tip.position[0], 0.0);
        assert_eq!(tip.position[1], 1.0);
    }

    #[test]
    fn test_ground_quad_is_flat() {
        let quad = MeshGeometry::ground_quad(5.0);
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices.len(), 6);
        assert!(quad.vertices.iter().all(|v| v.position[1] == 0.0));
        assert!(quad.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_missing_obj_is_an_asset_error() {
        let err = MeshGeometry::from_obj(Path::new("no_such_file.obj")).unwrap_err();
        assert!(matches!(err, Error::Asset(_)));
    }
}
