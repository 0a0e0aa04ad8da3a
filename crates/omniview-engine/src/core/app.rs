use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::device::RenderSurface;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
pub trait App {
    /// Called for every window event, before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once after the window is created and again on every resize or
    /// scale-factor change. `size` is the window's inner size in physical
    /// pixels; the app is expected to bring `surface` to that size.
    fn on_resize(&mut self, surface: &mut dyn RenderSurface, size: PhysicalSize<u32>);

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
