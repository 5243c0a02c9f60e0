//! Meshes and scene props

pub mod mesh;
pub mod prop;

pub use mesh::{Mesh, MeshGeometry, Vertex};
pub use prop::Prop;
