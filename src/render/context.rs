//! GPU context management using wgpu

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;
use winit::window::Window;

use crate::core::error::Error;

/// GPU rendering context
///
/// Owns the device, queue and presentation surface for the process lifetime.
/// Constructed once at startup and passed by reference to every component
/// that records GPU work.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    /// Set when the device reports an unrecoverable error. Once set, the
    /// context refuses to hand out frame targets instead of submitting to a
    /// dead device.
    invalid: Arc<AtomicBool>,
}

impl GpuContext {
    /// Acquire a GPU context, blocking the calling thread for at most
    /// `timeout`. Adapter selection prefers the high-performance GPU.
    /// Timeout or failure is fatal; nothing downstream can run without a
    /// device.
    pub fn acquire(window: Arc<Window>, timeout: Duration) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(pollster::block_on(Self::new(window)));
        });
        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(Error::Gpu(format!(
                "adapter/device acquisition did not complete within {timeout:?}"
            ))),
        }
    }

    /// Create a new GPU context from a window
    pub async fn new(window: Arc<Window>) -> Result<Self, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| Error::Gpu(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Gpu(format!("no suitable adapter found: {e:?}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("veld_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| Error::Gpu(e.to_string()))?;

        let invalid = Arc::new(AtomicBool::new(false));
        let flag = invalid.clone();
        device.on_uncaptured_error(Arc::new(move |error| {
            log::error!("uncaptured GPU error: {error}");
            if matches!(error, wgpu::Error::OutOfMemory { .. }) {
                flag.store(true, Ordering::SeqCst);
            }
        }));

        let size = window.inner_size();
        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(capabilities.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            // Vsync-bound presentation
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            config,
            invalid,
        })
    }

    /// (Re)configure the presentation surface. Called at startup and on
    /// every resize; zero dimensions are clamped.
    pub fn configure_surface(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    /// Get the surface texture for this frame.
    ///
    /// Returns `None` on transient acquisition failures (resize, minimize);
    /// the caller skips the frame and retries next loop iteration.
    pub fn current_frame_target(&mut self) -> Option<wgpu::SurfaceTexture> {
        if self.is_invalid() {
            log::error!("GPU context is invalid, refusing to acquire frame target");
            return None;
        }
        match self.surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::warn!("surface outdated, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquisition timed out, skipping frame");
                None
            }
            Err(e) => {
                log::error!("failed to acquire surface texture: {e}");
                self.invalid.store(true, Ordering::SeqCst);
                None
            }
        }
    }

    /// Whether the device has reported an unrecoverable error
    pub fn is_invalid(&self) -> bool {
        self.invalid.load(Ordering::SeqCst)
    }

    /// Get surface size
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Get surface format
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}
