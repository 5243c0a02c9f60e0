//! Veld - real-time procedural grass field renderer

pub mod core;
pub mod field;
pub mod render;
pub mod scene;
