//! Device and queue ownership.

use crate::builder::BufferBuilder;
use crate::surface::SurfaceWrapper;
use tracing::info;
use wgpu::Instance;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Request Adapter Error: {0}")]
    RequestAdapterError(#[from] wgpu::RequestAdapterError),
    #[error("Request Device Error: {0}")]
    RequestDeviceError(#[from] wgpu::RequestDeviceError),
    #[error("Surface Error: {0}")]
    RequestSurfaceError(#[from] wgpu::SurfaceError),
    #[error("Create surface error: {0}")]
    CreateSurfaceError(#[from] wgpu::CreateSurfaceError),
    #[error("surface is not supported by the adapter")]
    SurfaceUnsupported,
}

pub struct Renderer {
    instance: Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Renderer {
    pub async fn new() -> Result<Self, RendererError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await?;
        info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Renderer"),
                ..Default::default()
            })
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Configure a window surface for presentation.
    pub fn create_surface(
        &self,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<SurfaceWrapper, RendererError> {
        SurfaceWrapper::new(&self.adapter, &self.device, surface, width, height)
    }

    /// Start building a GPU buffer.
    pub fn create_buffer(&self) -> BufferBuilder<'_> {
        BufferBuilder::new(&self.device)
    }
}
