//! Frame orchestration: encodes the pass sequence and presents
//!
//! Pass order each frame: sky (clears color), grass (clears depth),
//! screen-space shadows, scene props (resolves the multisample target to
//! the surface), then the overlay on the resolved surface.

use crate::core::camera::Camera;
use crate::core::error::Error;
use crate::field::{BladeAppearance, LightSettings, ShadowSettings};
use crate::render::buffer::GlobalsBuffer;
use crate::render::compute::BladeCompute;
use crate::render::context::GpuContext;
use crate::render::pipeline::{GrassPipeline, ScenePipeline, ShadowPipeline, SkyPipeline};
use crate::render::texture::{RenderTargets, Texture};
use crate::scene::mesh::{Mesh, MeshGeometry};
use crate::scene::Prop;

/// Anything drawn on the resolved surface after the 3D passes. Debug HUDs
/// and UI layers implement this.
pub trait Overlay {
    fn draw(&mut self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView);
}

/// Blade mesh tessellation along the curve
const BLADE_SEGMENTS: u32 = 4;
/// Blade mesh width at the root, world units
const BLADE_WIDTH: f32 = 0.05;

/// Pass labels in submission order. The shadow pass must follow grass so
/// the depth it reads is this frame's; the scene pass resolves to the
/// surface, and the overlay draws on the resolved surface after it.
pub const PASS_ORDER: [&str; 5] = [
    "sky_pass",
    "grass_pass",
    "shadow_pass",
    "scene_pass",
    "overlay_pass",
];

pub struct Renderer {
    globals: GlobalsBuffer,
    targets: RenderTargets,
    sky: SkyPipeline,
    grass: GrassPipeline,
    shadow: ShadowPipeline,
    scene: ScenePipeline,
    blade_mesh: Mesh,
    shadows_enabled: bool,
}

impl Renderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        blades: &BladeCompute,
    ) -> Self {
        let globals = GlobalsBuffer::new(device);
        let targets = RenderTargets::new(device, color_format, width, height);

        let sky = SkyPipeline::new(device, globals.bind_group_layout(), color_format);

        let normal_map = Texture::flat_normal(device, queue);
        let grass = GrassPipeline::new(
            device,
            globals.bind_group_layout(),
            &normal_map,
            blades.blade_buffer(),
            color_format,
        );

        let shadow = ShadowPipeline::new(
            device,
            globals.bind_group_layout(),
            targets.depth_view(),
            color_format,
        );
        let scene = ScenePipeline::new(device, globals.bind_group_layout(), color_format);

        let blade_mesh = Mesh::new(device, queue, &MeshGeometry::blade(BLADE_SEGMENTS, BLADE_WIDTH));

        let appearance = BladeAppearance::default();
        grass.update_params(queue, &appearance);
        shadow.update_params(queue, &ShadowSettings::default());

        Self {
            globals,
            targets,
            sky,
            grass,
            shadow,
            scene,
            blade_mesh,
            shadows_enabled: appearance.shadows > 0.0,
        }
    }

    /// Upload this frame's camera, lighting and time
    pub fn update_globals(
        &self,
        queue: &wgpu::Queue,
        camera: &Camera,
        light: &LightSettings,
        time: f32,
        frame: u32,
    ) {
        self.globals.update(queue, camera, light, time, frame);
    }

    /// Upload new blade shading parameters
    pub fn update_appearance(&mut self, queue: &wgpu::Queue, appearance: &BladeAppearance) {
        self.grass.update_params(queue, appearance);
        self.shadows_enabled = appearance.shadows > 0.0;
    }

    /// Upload new contact shadow parameters
    pub fn update_shadow_params(&self, queue: &wgpu::Queue, settings: &ShadowSettings) {
        self.shadow.update_params(queue, settings);
    }

    /// Swap the grass normal map
    pub fn set_normal_map(&mut self, device: &wgpu::Device, normal_map: &Texture) {
        self.grass.set_normal_map(device, normal_map);
    }

    /// The scene pipeline, needed to assemble props
    pub fn scene_pipeline(&self) -> &ScenePipeline {
        &self.scene
    }

    /// Recreate the window-sized targets and every bind group that
    /// referenced them
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets.resize(device, width, height);
        self.shadow.rebind_depth(device, self.targets.depth_view());
    }

    /// Re-bind the blade storage after the field was rebuilt at a new
    /// blade count
    pub fn rebind_blades(&mut self, device: &wgpu::Device, blades: &BladeCompute) {
        self.grass.rebind_blades(device, blades.blade_buffer());
    }

    /// Encode and present one frame. Returns Ok(()) without drawing when
    /// no frame target is available this frame.
    pub fn render(
        &mut self,
        ctx: &mut GpuContext,
        blade_count: u32,
        props: &[Prop],
        overlay: Option<&mut dyn Overlay>,
    ) -> Result<(), Error> {
        if ctx.is_invalid() {
            return Err(Error::Gpu("device is lost, refusing to submit".into()));
        }
        let Some(frame) = ctx.current_frame_target() else {
            return Ok(());
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let msaa_view = self.targets.msaa_view(&ctx.device).clone();
        let depth_view = self.targets.depth_view().clone();

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        // Sky: clears the color target, fills the background
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(PASS_ORDER[0]),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &msaa_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.sky.draw(&mut pass, self.globals.bind_group());
        }

        // Grass: instanced blades, first depth writer; the shadow pass
        // reads the depth written here
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(PASS_ORDER[1]),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &msaa_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.grass
                .draw(&mut pass, self.globals.bind_group(), &self.blade_mesh, blade_count);
        }

        // Contact shadows: reads the depth target as a texture, so this
        // pass carries no depth attachment
        if self.shadows_enabled {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(PASS_ORDER[2]),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &msaa_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.shadow.draw(&mut pass, self.globals.bind_group());
        }

        // Scene props; this pass also resolves the multisample target to
        // the surface, so it runs even with no props to draw
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(PASS_ORDER[3]),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &msaa_view,
                    depth_slice: None,
                    resolve_target: Some(&surface_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            for prop in props {
                self.scene.draw(&mut pass, self.globals.bind_group(), prop);
            }
        }

        if let Some(overlay) = overlay {
            overlay.draw(&mut encoder, &surface_view);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_order() {
        assert_eq!(PASS_ORDER.first(), Some(&"sky_pass"));
        assert_eq!(PASS_ORDER.last(), Some(&"overlay_pass"));
        let grass = PASS_ORDER.iter().position(|p| *p == "grass_pass");
        let shadow = PASS_ORDER.iter().position(|p| *p == "shadow_pass");
        let scene = PASS_ORDER.iter().position(|p| *p == "scene_pass");
        assert!(grass < shadow, "shadow reads the depth grass wrote");
        assert!(shadow < scene, "scene resolves after shadows are blended");
    }
}
