use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Call order: `on_gpu_ready` once, then any number of `on_resize` /
/// `on_window_event` / `on_frame`, then `on_exit` once. `on_exit` runs while
/// the primary GPU context is still alive.
pub trait App {
    /// The primary context exists; create renderers and secondary contexts.
    /// An error aborts the runtime.
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()>;

    /// Surface size changed (physical pixels).
    fn on_resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let _ = (size, scale_factor);
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per paced frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    fn on_exit(&mut self) {}
}
