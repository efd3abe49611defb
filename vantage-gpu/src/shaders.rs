//! WGSL shader sources, embedded at compile time.

pub const MESH_VERTEX: &str = include_str!("../shaders/mesh_vertex.wgsl");
pub const MESH_FRAGMENT: &str = include_str!("../shaders/mesh_fragment.wgsl");
pub const POINT_VERTEX: &str = include_str!("../shaders/point_vertex.wgsl");
pub const POINT_FRAGMENT: &str = include_str!("../shaders/point_fragment.wgsl");
pub const LINE_VERTEX: &str = include_str!("../shaders/line_vertex.wgsl");
pub const LINE_FRAGMENT: &str = include_str!("../shaders/line_fragment.wgsl");
