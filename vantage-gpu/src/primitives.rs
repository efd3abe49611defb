//! GPU-side primitive layouts.
//!
//! These are the bytemuck Pod mirror types of the WGSL storage/uniform
//! structs in `shaders/`. Field padding keeps the Rust layout in sync
//! with WGSL's 16-byte vec3 alignment.

use glam::{Mat4, Vec3};

/// Camera matrices uploaded once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_matrix: [[f32; 4]; 4],
    pub proj_matrix: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniforms {
    pub fn from_matrices(view: Mat4, proj: Mat4, position: Vec3) -> Self {
        Self {
            view_matrix: view.to_cols_array_2d(),
            proj_matrix: proj.to_cols_array_2d(),
            view_pos: position.to_array(),
            _padding: 0.0,
        }
    }

    pub fn identity() -> Self {
        Self::from_matrices(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO)
    }
}

/// One mesh vertex: unrolled triangle corner with its shading normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub normal: [f32; 3],
    pub _pad1: f32,
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            _pad0: 0.0,
            normal: normal.to_array(),
            _pad1: 0.0,
        }
    }
}

/// One point-cloud splat, expanded to a camera-facing triangle in the
/// vertex shader (3 vertices per point).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointPrimitive {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

impl PointPrimitive {
    pub fn new(position: Vec3, size: f32, color: Vec3, opacity: f32) -> Self {
        Self {
            position: position.to_array(),
            size,
            color: color.to_array(),
            opacity,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// One endpoint of a colored line segment (grid, axes).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
}

impl LineVertex {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            _pad0: 0.0,
            color: color.to_array(),
            _pad1: 0.0,
        }
    }
}
