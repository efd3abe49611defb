//! Window surface configuration.

use crate::renderer::RendererError;

/// A configured presentation surface.
pub struct SurfaceWrapper {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
    pub(crate) fn new(
        adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self, RendererError> {
        let config = surface
            .get_default_config(adapter, width.max(1), height.max(1))
            .ok_or(RendererError::SurfaceUnsupported)?;
        surface.configure(device, &config);
        Ok(Self { surface, config })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn config(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }

    /// Re-apply a (typically resized) configuration.
    pub fn reconfigure(&mut self, device: &wgpu::Device, config: wgpu::SurfaceConfiguration) {
        self.surface.configure(device, &config);
        self.config = config;
    }

    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}
