//! GPU rendering of map layers.
//!
//! Convention:
//! - layer geometry is in lon/lat degrees (x east, y north).
//! - the vertex shader projects to NDC with the [`MapView`] uniform.

mod ctx;
mod layer_renderer;
mod map_view;

pub use ctx::{RenderCtx, RenderTarget};
pub use layer_renderer::LayerRenderer;
pub use map_view::{MapView, ViewUniform};
