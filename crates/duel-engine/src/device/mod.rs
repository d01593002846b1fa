//! GPU device + surface management.
//!
//! Creates the wgpu adapter/device/queue, keeps the window surface configured
//! across resizes, and hands out one encoder + view per frame.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::{GpuErrorKind, SurfaceErrorAction, log_gpu_error};
pub use frame::GpuFrame;
pub use init::GpuInit;
