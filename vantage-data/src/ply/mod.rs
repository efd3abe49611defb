//! PLY file decoding.

mod loader;

pub use loader::{PlyError, decode_ply, load_ply_file};
