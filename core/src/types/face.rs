use serde::{Deserialize, Serialize};

use crate::constants::TOP_PART_FACE_OFFSET;

/// A face known to the client.
///
/// Image data is owned by the face cache; map squares only keep this small
/// descriptor so that they can be copied out cheaply by readers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub face_num: u32,
    /// Footprint in map squares; big faces span more than one square.
    pub tile_width: u8,
    pub tile_height: u8,
    /// Set for the upper half of a split face.
    pub top_part: bool,
}

impl Face {
    pub fn new(face_num: u32) -> Self {
        Self {
            face_num,
            tile_width: 1,
            tile_height: 1,
            top_part: false,
        }
    }

    pub fn with_size(face_num: u32, tile_width: u8, tile_height: u8) -> Self {
        Self {
            face_num,
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
            top_part: false,
        }
    }

    /// The face number map squares refer to. Top parts are registered under
    /// a shifted number but displayed in place of the base face.
    pub fn map_face_num(&self) -> u32 {
        if self.top_part && self.face_num > TOP_PART_FACE_OFFSET {
            self.face_num - TOP_PART_FACE_OFFSET
        } else {
            self.face_num
        }
    }

    pub fn is_multi_tile(&self) -> bool {
        self.tile_width > 1 || self.tile_height > 1
    }
}

#[cfg(test)]
mod tests {
    use super::Face;

    #[test]
    fn map_face_num_strips_top_part_offset() {
        let mut face = Face::new(10_042);
        assert_eq!(face.map_face_num(), 10_042);
        face.top_part = true;
        assert_eq!(face.map_face_num(), 42);
    }

    #[test]
    fn map_face_num_keeps_small_top_part_numbers() {
        let mut face = Face::new(7);
        face.top_part = true;
        assert_eq!(face.map_face_num(), 7);
    }

    #[test]
    fn with_size_never_produces_empty_footprint() {
        let face = Face::with_size(3, 0, 2);
        assert_eq!(face.tile_width, 1);
        assert_eq!(face.tile_height, 2);
        assert!(face.is_multi_tile());
        assert!(!Face::new(3).is_multi_tile());
    }
}
