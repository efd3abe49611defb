//! Vantage Data Crate
//!
//! Geometry loading and processing for the viewer. This crate is
//! GPU-agnostic: PLY decoding, bounding boxes, and the display transform
//! that normalizes a model for presentation.

pub mod bounds;
pub mod geometry;
pub mod ply;
pub mod transform;

pub use bounds::Aabb;
pub use geometry::Geometry;
pub use ply::{PlyError, decode_ply, load_ply_file};
pub use transform::{DisplayTransform, PreparedModel, TransformError, prepare_for_display};
