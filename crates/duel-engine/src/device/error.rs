/// What the frame loop should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering resumes next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Device state is unrecoverable (out of memory). The scene must be rebuilt
    /// on a new device, so the runtime exits instead of retrying.
    Fatal,
}

/// Class of a device error, for logs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GpuErrorKind {
    OutOfMemory,
    Validation,
    Internal,
}

impl GpuErrorKind {
    pub fn of(err: &wgpu::Error) -> Self {
        match err {
            wgpu::Error::OutOfMemory { .. } => GpuErrorKind::OutOfMemory,
            wgpu::Error::Validation { .. } => GpuErrorKind::Validation,
            wgpu::Error::Internal { .. } => GpuErrorKind::Internal,
        }
    }
}

/// Logs a device error with where it was caught. Never fatal on its own; a
/// lost device shows up as a surface error on the next frame.
pub fn log_gpu_error(context: &str, err: &wgpu::Error) -> GpuErrorKind {
    let kind = GpuErrorKind::of(err);
    log::error!("gpu {kind:?} error ({context}): {err}");
    kind
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn validation(description: &str) -> wgpu::Error {
        wgpu::Error::Validation {
            source: Box::new(io::Error::other(description.to_string())),
            description: description.to_string(),
        }
    }

    #[test]
    fn classifies_device_errors() {
        assert_eq!(GpuErrorKind::of(&validation("bad bind group")), GpuErrorKind::Validation);
        let oom = wgpu::Error::OutOfMemory {
            source: Box::new(io::Error::other("oom")),
        };
        assert_eq!(GpuErrorKind::of(&oom), GpuErrorKind::OutOfMemory);
    }

    #[test]
    fn logging_reports_the_kind_and_keeps_going() {
        let err = validation("index buffer too small");
        assert_eq!(log_gpu_error("frame", &err), GpuErrorKind::Validation);
        assert_eq!(err.to_string(), "index buffer too small");
    }
}
