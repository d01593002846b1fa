//! Input subsystem.
//!
//! Public types are platform-agnostic; `winit` translation lives in one
//! crate-private module used by the runtime. Events are delivered to the app
//! synchronously as they arrive; there is no per-frame event buffer.

mod state;
mod types;
pub(crate) mod winit;

pub use state::InputState;
pub use types::{
    ButtonState, InputEvent, Key, Modifiers, MouseButton, MouseWheelDelta, PointerButtonEvent,
};
