//! Duel client engine crate.
//!
//! Owns the platform loop, GPU device/surface and input plumbing that the
//! duel scene renders through.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
