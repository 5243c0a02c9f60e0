//! Render pass pipelines
//!
//! One struct per pass. Each owns its pipeline, parameter buffers and the
//! bind groups for everything except group 0, which is always the shared
//! `GlobalsBuffer` bind group passed in at draw time.

pub mod sky;
pub mod grass;
pub mod shadow;
pub mod scene;

pub use sky::SkyPipeline;
pub use grass::{BladeShadingParams, GrassPipeline};
pub use shadow::ShadowPipeline;
pub use scene::ScenePipeline;
