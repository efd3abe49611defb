//! High-level builder API for creating GPU buffers.
//!
//! A simpler, more ergonomic API compared to directly using wgpu
//! descriptors.

use crate::registry::{Handle, ResourceRegistry};

/// Buffer usage flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform buffer
    Uniform,
    /// Storage buffer (read-only or read-write)
    Storage { read_only: bool },
}

impl BufferUsage {
    fn to_wgpu(self) -> wgpu::BufferUsages {
        match self {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            BufferUsage::Storage { read_only: _ } => wgpu::BufferUsages::STORAGE,
        }
    }
}

/// Builder for creating GPU buffers.
pub struct BufferBuilder<'a> {
    device: &'a wgpu::Device,
    label: Option<String>,
    size: Option<u64>,
    data: Option<&'a [u8]>,
    usage: BufferUsage,
}

impl<'a> BufferBuilder<'a> {
    pub(crate) fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            label: None,
            size: None,
            data: None,
            usage: BufferUsage::Vertex,
        }
    }

    /// Set the buffer label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set buffer size (for empty buffers).
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set buffer data from a slice of Pod types.
    pub fn with_pod_data<T: bytemuck::Pod>(mut self, data: &'a [T]) -> Self {
        self.data = Some(bytemuck::cast_slice(data));
        self
    }

    /// Set buffer usage.
    pub fn usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Build the buffer and register it in the registry.
    pub fn build(
        self,
        registry: &mut ResourceRegistry,
    ) -> Result<Handle<wgpu::Buffer>, BufferBuildError> {
        use wgpu::util::DeviceExt;

        let buffer = if let Some(data) = self.data {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: self.label.as_deref(),
                    contents: data,
                    usage: self.usage.to_wgpu(),
                })
        } else if let Some(size) = self.size {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: self.label.as_deref(),
                size,
                usage: self.usage.to_wgpu(),
                mapped_at_creation: false,
            })
        } else {
            return Err(BufferBuildError::MissingSizeOrData);
        };

        Ok(registry.insert(buffer))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BufferBuildError {
    #[error("Buffer must have either size or data")]
    MissingSizeOrData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_conversion() {
        assert_eq!(BufferUsage::Vertex.to_wgpu(), wgpu::BufferUsages::VERTEX);
        assert_eq!(BufferUsage::Index.to_wgpu(), wgpu::BufferUsages::INDEX);
        assert!(
            BufferUsage::Uniform
                .to_wgpu()
                .contains(wgpu::BufferUsages::UNIFORM)
        );
        assert!(
            BufferUsage::Uniform
                .to_wgpu()
                .contains(wgpu::BufferUsages::COPY_DST)
        );
        assert_eq!(
            BufferUsage::Storage { read_only: true }.to_wgpu(),
            wgpu::BufferUsages::STORAGE
        );
    }
}
