//! Grass field viewer
//!
//! Fly camera over a procedurally generated, wind-animated grass field.
//!
//! Controls:
//!   WASD / Space / Q  move (hold Shift to sprint)
//!   left click        capture the mouse for looking around
//!   Escape            release the mouse
//!   Up / Down         wind strength
//!   Left / Right      wind frequency
//!   [ / ]             blade density (rebuilds the field)
//!   T                 toggle contact shadows
//!   R                 regenerate the field
//!   P                 log blade statistics

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use glam::{Mat4, Vec3};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::KeyCode,
    window::{CursorGrabMode, Window, WindowId},
};

use veld::core::camera::Camera;
use veld::core::camera_controller::FlyCameraController;
use veld::core::input::InputState;
use veld::core::logging;
use veld::core::time::FrameTimer;
use veld::field::{BladeAppearance, FieldSettings, LightSettings, ShadowSettings, WindSettings};
use veld::render::compute::BladeCompute;
use veld::render::texture::Texture;
use veld::render::{GpuContext, Renderer};
use veld::scene::{MeshGeometry, Prop};

const GPU_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    renderer: Option<Renderer>,
    blades: Option<BladeCompute>,
    props: Vec<Prop>,

    camera: Camera,
    controller: FlyCameraController,
    input: InputState,
    timer: FrameTimer,

    field: FieldSettings,
    wind: WindSettings,
    appearance: BladeAppearance,
    light: LightSettings,
    shadows: ShadowSettings,
}

impl App {
    fn new() -> Self {
        let field = FieldSettings::default();
        let eye = Vec3::new(0.0, 2.5, field.side_length * 0.8);
        let target = Vec3::new(0.0, 0.5, 0.0);
        let mut camera = Camera::look_at(eye, target);
        camera.set_aspect(1280.0, 720.0);

        Self {
            window: None,
            gpu: None,
            renderer: None,
            blades: None,
            props: Vec::new(),
            camera,
            controller: FlyCameraController::new(4.0, 2.0),
            input: InputState::new(),
            timer: FrameTimer::new(),
            field,
            wind: WindSettings::default(),
            appearance: BladeAppearance::default(),
            light: LightSettings::default(),
            shadows: ShadowSettings::default(),
        }
    }

    fn set_mouse_captured(&mut self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };
        if captured {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                log::warn!("cursor grab unavailable: {e}");
                return;
            }
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.input.set_mouse_captured(captured);
    }

    /// Rebuild the blade storage at the current settings and re-bind the
    /// grass pipeline to the new buffer
    fn rebuild_field(&mut self) {
        let (Some(gpu), Some(blades), Some(renderer)) =
            (&self.gpu, &mut self.blades, &mut self.renderer)
        else {
            return;
        };
        blades.rebuild(&gpu.device, &gpu.queue, &self.field);
        renderer.rebind_blades(&gpu.device, blades);
        log::info!(
            "field rebuilt: {} blades ({} per side)",
            self.field.total_blades(),
            self.field.blades_per_side()
        );
    }

    fn handle_keys(&mut self) {
        if self.input.is_key_just_pressed(KeyCode::Escape) {
            self.set_mouse_captured(false);
        }

        let mut wind_changed = false;
        if self.input.is_key_just_pressed(KeyCode::ArrowUp) {
            self.wind.strength = (self.wind.strength + 0.1).min(3.0);
            wind_changed = true;
        }
        if self.input.is_key_just_pressed(KeyCode::ArrowDown) {
            self.wind.strength = (self.wind.strength - 0.1).max(0.0);
            wind_changed = true;
        }
        if self.input.is_key_just_pressed(KeyCode::ArrowRight) {
            self.wind.frequency = (self.wind.frequency + 0.1).min(5.0);
            wind_changed = true;
        }
        if self.input.is_key_just_pressed(KeyCode::ArrowLeft) {
            self.wind.frequency = (self.wind.frequency - 0.1).max(0.0);
            wind_changed = true;
        }
        if wind_changed {
            if let (Some(gpu), Some(blades)) = (&self.gpu, &self.blades) {
                blades.update_wind(&gpu.queue, &self.wind);
                log::info!(
                    "wind: strength {:.1}, frequency {:.1}",
                    self.wind.strength,
                    self.wind.frequency
                );
            }
        }

        if self.input.is_key_just_pressed(KeyCode::BracketLeft) {
            self.field.density = (self.field.density - 2.5).max(2.5);
            self.rebuild_field();
        }
        if self.input.is_key_just_pressed(KeyCode::BracketRight) {
            self.field.density = (self.field.density + 2.5).min(40.0);
            self.rebuild_field();
        }
        if self.input.is_key_just_pressed(KeyCode::KeyR) {
            self.rebuild_field();
        }

        if self.input.is_key_just_pressed(KeyCode::KeyP) {
            if let (Some(gpu), Some(blades)) = (&self.gpu, &self.blades) {
                match blades.read_back_blades(&gpu.device, &gpu.queue) {
                    Ok(instances) => {
                        let (min_h, max_h) = instances.iter().fold(
                            (f32::MAX, f32::MIN),
                            |(lo, hi), b| (lo.min(b.height), hi.max(b.height)),
                        );
                        log::info!(
                            "{} blades, height {:.2}..{:.2}",
                            instances.len(),
                            min_h,
                            max_h
                        );
                    }
                    Err(e) => log::warn!("blade readback failed: {e}"),
                }
            }
        }

        if self.input.is_key_just_pressed(KeyCode::KeyT) {
            self.appearance.shadows = if self.appearance.shadows > 0.0 { 0.0 } else { 1.0 };
            if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
                renderer.update_appearance(&gpu.queue, &self.appearance);
                log::info!("contact shadows: {}", self.appearance.shadows > 0.0);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.timer.tick();
        self.handle_keys();
        self.controller
            .update(&mut self.camera, &self.input, self.timer.delta_secs());

        let (Some(gpu), Some(blades), Some(renderer)) =
            (&mut self.gpu, &self.blades, &mut self.renderer)
        else {
            return;
        };

        blades.compute_movement(&gpu.device, &gpu.queue, self.timer.elapsed_secs());
        renderer.update_globals(
            &gpu.queue,
            &self.camera,
            &self.light,
            self.timer.elapsed_secs(),
            self.timer.frame_count() as u32,
        );

        if let Err(e) = renderer.render(gpu, blades.blade_count(), &self.props, None) {
            log::error!("render failed: {e}");
            event_loop.exit();
            return;
        }

        if self.timer.frame_count() % 300 == 0 {
            log::info!("{:.1} fps, {} blades", self.timer.fps(), blades.blade_count());
        }

        self.input.end_frame();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Veld - Grass Field")
            .with_inner_size(PhysicalSize::new(1280, 720));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );

        let gpu = GpuContext::acquire(window.clone(), GPU_ACQUIRE_TIMEOUT)
            .expect("Failed to create GPU context");

        let size = window.inner_size();
        self.camera.set_aspect(size.width as f32, size.height as f32);
        log::info!("window created: {}x{}", size.width, size.height);
        log::info!("GPU: {}", gpu.adapter.get_info().name);

        let blades = BladeCompute::new(&gpu.device, &self.field);
        blades.generate(&gpu.device, &gpu.queue, &self.field);
        blades.update_wind(&gpu.queue, &self.wind);
        log::info!(
            "field generated: {} blades ({} per side)",
            self.field.total_blades(),
            self.field.blades_per_side()
        );

        let mut renderer = Renderer::new(
            &gpu.device,
            &gpu.queue,
            gpu.format(),
            size.width,
            size.height,
            &blades,
        );
        renderer.update_appearance(&gpu.queue, &self.appearance);
        renderer.update_shadow_params(&gpu.queue, &self.shadows);

        // Soil-colored ground plane under the field
        let ground = Prop::new(
            &gpu.device,
            &gpu.queue,
            renderer.scene_pipeline(),
            &MeshGeometry::ground_quad(self.field.side_length * 0.5),
            Texture::solid(&gpu.device, &gpu.queue, [64, 48, 24, 255]),
            Mat4::IDENTITY,
        );
        self.props.push(ground);

        // Optional assets; present-but-broken files are fatal
        let normal_path = Path::new("assets/grass_normal.png");
        if normal_path.exists() {
            match Texture::from_path(&gpu.device, &gpu.queue, normal_path, false) {
                Ok(normal_map) => renderer.set_normal_map(&gpu.device, &normal_map),
                Err(e) => {
                    log::error!("{e}");
                    event_loop.exit();
                    return;
                }
            }
        }
        let prop_path = Path::new("assets/prop.obj");
        if prop_path.exists() {
            match MeshGeometry::from_obj(prop_path) {
                Ok(geometries) => {
                    for geometry in &geometries {
                        self.props.push(Prop::new(
                            &gpu.device,
                            &gpu.queue,
                            renderer.scene_pipeline(),
                            geometry,
                            Texture::solid(&gpu.device, &gpu.queue, [150, 150, 150, 255]),
                            Mat4::from_translation(Vec3::new(2.0, 0.0, 2.0)),
                        ));
                    }
                }
                Err(e) => {
                    log::error!("{e}");
                    event_loop.exit();
                    return;
                }
            }
        }

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.blades = Some(blades);
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.process_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    self.camera.set_aspect(size.width as f32, size.height as f32);
                    if let Some(gpu) = &mut self.gpu {
                        gpu.configure_surface(size.width, size.height);
                        if let Some(renderer) = &mut self.renderer {
                            renderer.resize(&gpu.device, size.width, size.height);
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                state: winit::event::ElementState::Pressed,
                button: winit::event::MouseButton::Left,
                ..
            } => {
                if !self.input.is_mouse_captured() {
                    self.set_mouse_captured(true);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_motion(delta);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    logging::init();

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
