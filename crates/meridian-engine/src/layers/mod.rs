//! Map layers: geometry conversion, wgpu-backed worker context and builders.

mod builders;
mod gpu;
mod layer;
pub mod mesh;

pub use builders::{DOT_SIZE, MAX_SPRITE_SIZE, default_builders, dot_icon, load_icon, sprite_size};
pub use gpu::{LayerLayouts, StyleUniform, WgpuContext, WgpuFence};
pub use layer::{LayerGeometry, ShapefileLayer};
