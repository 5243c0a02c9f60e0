//! Window-sized depth and multisample color targets

/// Multisample count for the geometry passes
pub const SAMPLE_COUNT: u32 = 4;

/// Depth buffer format; also bound as a texture by the shadow pass
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth and multisample color targets tied to the surface size.
///
/// The depth target is created eagerly; the multisample color target is
/// created lazily on first use. Both are dropped and recreated on resize,
/// along with every bind group that referenced them.
pub struct RenderTargets {
    width: u32,
    height: u32,
    color_format: wgpu::TextureFormat,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

impl RenderTargets {
    /// Create targets sized to the surface
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let depth_view = Self::create_depth_view(device, width, height);
        Self {
            width,
            height,
            color_format,
            depth_view,
            msaa_view: None,
        }
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: SAMPLE_COUNT,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Depth target view
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Multisample color target view, created on first use
    pub fn msaa_view(&mut self, device: &wgpu::Device) -> &wgpu::TextureView {
        let (width, height, format) = (self.width, self.height, self.color_format);
        self.msaa_view.get_or_insert_with(|| {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("msaa_color_target"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: SAMPLE_COUNT,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            texture.create_view(&wgpu::TextureViewDescriptor::default())
        })
    }

    /// Recreate targets at a new size; the old views are dropped so no
    /// stale references survive
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.depth_view = Self::create_depth_view(device, width, height);
        self.msaa_view = None;
    }

    /// Current target size
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
