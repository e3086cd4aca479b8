use serde::{Deserialize, Serialize};

use crate::constants::{LAYERS_PER_FLOOR, NUM_LAYERS};

/// A logical map location as sent by the server: square coordinates relative
/// to the visible map plus a face layer. The layer also selects the floor
/// band (`layer / 3`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub layer: usize,
}

impl Location {
    pub fn new(x: i32, y: i32, layer: usize) -> Self {
        Self { x, y, layer }
    }

    pub fn is_valid_layer(&self) -> bool {
        self.layer < NUM_LAYERS
    }

    /// Floor band index of this location's layer.
    pub fn floor(&self) -> usize {
        self.layer / LAYERS_PER_FLOOR
    }

    /// Same layer, shifted square coordinates.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            layer: self.layer,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, layer {})", self.x, self.y, self.layer)
    }
}
