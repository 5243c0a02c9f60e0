//! User-facing field, wind, lighting and shadow settings.
//!
//! These are plain CPU-side records. The GPU-visible `#[repr(C)]` mirrors
//! live next to the pipelines that upload them.

use crate::core::types::Vec3;

/// Grass field geometry and blade shape parameters.
///
/// Blade counts are derived, never stored, so they cannot go stale when
/// `side_length` or `density` change. Everything sized from `total_blades()`
/// must be reallocated after such a change (see `BladeCompute::rebuild`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSettings {
    /// Field side length in world units
    pub side_length: f32,
    /// Blades per unit length
    pub density: f32,
    /// Base blade height
    pub blade_height: f32,
    /// Amplitude of the per-blade height noise
    pub height_noise_amplitude: f32,
    /// Spatial frequency of the per-blade height noise
    pub height_noise_frequency: f32,
}

impl FieldSettings {
    /// Blades along one side of the square field, clamped to at least 1 so a
    /// degenerate field never produces a zero-sized buffer or dispatch.
    pub fn blades_per_side(&self) -> u32 {
        ((self.side_length * self.density * 2.0).floor() as u32).max(1)
    }

    /// Total blade instances in the field
    pub fn total_blades(&self) -> u32 {
        let side = self.blades_per_side();
        side * side
    }

    /// Largest random offset applied to a blade's grid position, so that
    /// jittered blades stay within their own grid cell.
    pub fn max_position_jitter(&self) -> f32 {
        self.side_length * 2.0 / self.blades_per_side() as f32
    }
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            side_length: 10.0,
            density: 15.0,
            blade_height: 0.9,
            height_noise_amplitude: 0.4,
            height_noise_frequency: 0.3,
        }
    }
}

/// Wind parameters driving the movement compute pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindSettings {
    /// Wind direction in the XZ plane (Y is ignored by the sway model)
    pub direction: Vec3,
    /// Oscillation amplitude, 0.0 disables movement entirely
    pub strength: f32,
    /// Oscillations per second
    pub frequency: f32,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.8, 0.0, -0.5),
            strength: 0.75,
            frequency: 0.8,
        }
    }
}

/// Blade shading parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeAppearance {
    /// Color of the shortest blades (linear RGB)
    pub short_color: Vec3,
    /// Color of the tallest blades (linear RGB)
    pub tall_color: Vec3,
    /// Specular highlight color (linear RGB)
    pub specular_color: Vec3,
    pub ambient_strength: f32,
    pub diffuse_strength: f32,
    pub specular_strength: f32,
    /// Diffuse wrap factor, softens the terminator on thin blades
    pub wrap: f32,
    /// Screen-space shadow contribution, 0.0 or 1.0
    pub shadows: f32,
}

impl Default for BladeAppearance {
    fn default() -> Self {
        Self {
            short_color: Vec3::new(0.794, 0.641, 0.311),
            tall_color: Vec3::new(1.0, 0.913, 0.725),
            specular_color: Vec3::new(1.0, 0.968, 0.863),
            ambient_strength: 0.3,
            diffuse_strength: 0.8,
            specular_strength: 0.15,
            wrap: 1.0,
            shadows: 1.0,
        }
    }
}

/// Sky and sun parameters shared by every shading pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSettings {
    /// Sky color straight up (linear RGB)
    pub sky_up_color: Vec3,
    /// Sky color at the horizon/ground (linear RGB)
    pub sky_ground_color: Vec3,
    /// Sun color (linear RGB)
    pub sun_color: Vec3,
    /// Direction towards the sun, normalized on upload
    pub sun_direction: Vec3,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            sky_up_color: Vec3::new(0.275, 0.659, 1.0),
            sky_ground_color: Vec3::new(0.863, 0.952, 1.0),
            sun_color: Vec3::new(1.0, 0.886, 0.716),
            sun_direction: Vec3::new(0.2, 1.0, 0.2),
        }
    }
}

/// Screen-space contact shadow ray-march parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Maximum ray-march steps per pixel
    pub max_steps: u32,
    /// World-space ray length towards the sun
    pub ray_max_distance: f32,
    /// Depth-buffer thickness assumed for occluders
    pub thickness: f32,
    /// Rejection threshold against the originating depth
    pub max_depth_delta: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_steps: 32,
            ray_max_distance: 2.0,
            thickness: 0.1,
            max_depth_delta: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_counts() {
        let settings = FieldSettings {
            side_length: 10.0,
            density: 15.0,
            ..Default::default()
        };
        assert_eq!(settings.blades_per_side(), 300);
        assert_eq!(settings.total_blades(), 90_000);
    }

    #[test]
    fn test_derived_counts_follow_changes() {
        let mut settings = FieldSettings::default();
        let before = settings.total_blades();

        settings.density *= 2.0;
        let after = settings.total_blades();

        // Methods re-derive from current fields, so the count can never be
        // stale relative to the settings it was computed from.
        assert_eq!(after, settings.blades_per_side() * settings.blades_per_side());
        assert!(after > before);
    }

    #[test]
    fn test_degenerate_field_clamps_to_one_blade() {
        let settings = FieldSettings {
            side_length: 0.0,
            density: 0.0,
            ..Default::default()
        };
        assert_eq!(settings.blades_per_side(), 1);
        assert_eq!(settings.total_blades(), 1);
        assert!(settings.max_position_jitter().is_finite());
    }

    #[test]
    fn test_jitter_stays_within_cell() {
        let settings = FieldSettings::default();
        // The jitter bound equals twice the grid cell size
        let cell = settings.side_length * 2.0 / settings.blades_per_side() as f32;
        assert!((settings.max_position_jitter() - cell).abs() < 1e-6);
    }
}
