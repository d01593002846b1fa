use std::fmt;

use crate::cards::CardKey;

/// Errors surfaced by card operations on [`crate::DuelScene`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Every slot of the card vertex buffer is live.
    CardCapacity { capacity: usize },
    /// A card already occupies the address.
    Occupied(CardKey),
    /// No card at the address.
    NoCard(CardKey),
    /// The address names no zone block (e.g. monster sequence 7).
    InvalidKey(CardKey),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::CardCapacity { capacity } => {
                write!(f, "card buffer is full ({capacity} slots)")
            }
            SceneError::Occupied(key) => write!(f, "{key} is already occupied"),
            SceneError::NoCard(key) => write!(f, "no card at {key}"),
            SceneError::InvalidKey(key) => write!(f, "{key} is not a field position"),
        }
    }
}

impl std::error::Error for SceneError {}
