//! Grass field settings (user-facing simulation parameters)

pub mod settings;

pub use settings::{FieldSettings, WindSettings, BladeAppearance, LightSettings, ShadowSettings};
