//! Render context handed to draw callbacks.
//!
//! Renderers own their GPU resources and create them lazily against the
//! device in `RenderCtx`; the frame's clear pass has already run.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
