//! Shader-agnostic rendering delegation.

use crate::primitives::CameraUniforms;
use crate::registry::ResourceRegistry;
use crate::renderer::Renderer;
use std::error::Error;
use vantage_data::Aabb;

/// Context passed to the render delegate for rendering.
pub struct RenderContext<'a> {
    pub color_view: &'a wgpu::TextureView,
    pub depth_view: Option<&'a wgpu::TextureView>,
}

/// Trait for scene content. Implement this to decide what a frame draws.
pub trait RenderDelegate: Sized {
    /// Data needed to construct the delegate.
    type InitData;

    /// Create GPU resources for rendering.
    fn create(
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        surface_format: wgpu::TextureFormat,
        init_data: Self::InitData,
    ) -> Result<Self, Box<dyn Error>>;

    /// Scene bounds used for projection far-plane sizing.
    fn bounds(&self) -> Aabb;

    /// Return depth format if depth testing is needed. Default is None.
    fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        None
    }

    /// Per-frame update: camera upload, pending work, resource swaps.
    /// Receives the renderer (not just the queue) because delegates may
    /// create new buffers at runtime when a model is replaced.
    fn update(
        &mut self,
        renderer: &Renderer,
        registry: &mut ResourceRegistry,
        camera: &CameraUniforms,
    );

    /// Record render commands for one frame.
    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        ctx: RenderContext,
        registry: &ResourceRegistry,
    );
}
