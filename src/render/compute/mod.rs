//! Compute pipelines generating and animating the blade instance buffer

pub mod generator;

pub use generator::{blade_hash, sway_amount, BladeCompute, BladeInstance, GenParams, WindParams};
