//! Vantage GPU Crate
//!
//! Thin wgpu glue for the viewer: device/queue ownership, surface
//! configuration, a handle-based resource registry, and builder APIs for
//! buffers and render pipelines. Scene content is described by a
//! [`RenderDelegate`] implemented by the application.

pub mod builder;
pub mod delegate;
pub mod pipeline;
pub mod primitives;
pub mod registry;
pub mod renderer;
pub mod shaders;
pub mod surface;

pub use wgpu;

pub use builder::{BufferBuildError, BufferBuilder, BufferUsage};
pub use delegate::{RenderContext, RenderDelegate};
pub use pipeline::{PipelineBuildError, RenderPipelineBuilder};
pub use primitives::{CameraUniforms, LineVertex, MeshVertex, PointPrimitive};
pub use registry::{Handle, ResourceRegistry};
pub use renderer::{Renderer, RendererError};
pub use surface::SurfaceWrapper;
