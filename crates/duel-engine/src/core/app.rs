use crate::input::{InputEvent, InputState};

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`crate::window::Runtime`].
///
/// Callbacks run on the event-loop thread, strictly in arrival order: input
/// and resize between frames, `on_frame` once per redraw.
pub trait App {
    /// Called for every translated input event, after `input` has absorbed it.
    fn on_input(&mut self, event: &InputEvent, input: &InputState) -> AppControl {
        let _ = (event, input);
        AppControl::Continue
    }

    /// Called after the surface was resized, with the new physical size.
    fn on_resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
