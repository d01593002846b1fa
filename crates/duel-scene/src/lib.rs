//! Duel field scene.
//!
//! Maintains the 3D layout of zone blocks and cards, animates their visual
//! properties, streams their geometry into fixed GPU buffer regions and maps
//! pointer positions back onto the field through the camera.
//!
//! Everything except [`render`] is GPU-agnostic: vertex data is staged in CPU
//! regions with dirty spans, and [`render::FieldRenderer`] uploads them.

pub mod animator;
pub mod assets;
pub mod buffers;
pub mod camera;
pub mod cards;
pub mod command;
pub mod config;
pub mod error;
pub mod field;
pub mod layout;
pub mod render;
pub mod scene;
pub mod vertex;

#[cfg(test)]
pub(crate) mod testing;

pub use animator::{Animator, Easing};
pub use assets::{AssetProvider, SheetKind, TextureAtlas, TextureRegion};
pub use camera::Camera;
pub use cards::{CardKey, CardPosition, CardZone, Side};
pub use command::{CommandQueue, DuelCommand};
pub use config::{CameraConfig, HoverPulse, SceneConfig};
pub use error::SceneError;
pub use layout::{FieldLayout, LayoutRect, LayoutSource};
pub use render::FieldRenderer;
pub use scene::{DuelScene, HoverPos};
