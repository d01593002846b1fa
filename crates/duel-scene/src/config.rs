use std::f32::consts::FRAC_PI_4;

use crate::buffers::DEFAULT_CARD_CAPACITY;

/// Scene construction parameters.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Simultaneous card slots. Sizes the card vertex buffer once; not grown.
    pub card_capacity: usize,

    /// Initial scene size in pixels, replaced by `set_scene_size` on resize.
    pub scene_size: (f32, f32),

    pub camera: CameraConfig,
    pub hover: HoverPulse,

    /// Seconds for a card to travel to a new rest pose.
    pub move_duration: f64,

    /// Seconds for a card to fade in when added or out when removed by command.
    pub fade_duration: f64,

    /// Camera radius change per wheel notch.
    pub zoom_step: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            card_capacity: DEFAULT_CARD_CAPACITY,
            scene_size: (1024.0, 640.0),
            camera: CameraConfig::default(),
            hover: HoverPulse::default(),
            move_duration: 0.35,
            fade_duration: 0.25,
            zoom_step: 0.5,
        }
    }
}

/// Initial orbit pose and projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    pub radius: f32,
    /// Elevation above the field plane in radians; `π/2` looks straight down.
    pub angle: f32,
    pub xoffset: f32,
    pub yoffset: f32,
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            angle: 1.0,
            xoffset: 0.0,
            yoffset: 0.0,
            fovy: FRAC_PI_4,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Highlight oscillation used while the pointer rests on a block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HoverPulse {
    pub low: f32,
    pub high: f32,
    /// Seconds per low→high→low cycle.
    pub period: f64,
}

impl Default for HoverPulse {
    fn default() -> Self {
        Self {
            low: 0.2,
            high: 0.8,
            period: 1.0,
        }
    }
}
