//! Floor-band remapping.
//!
//! Additional floors are drawn by shifting their squares diagonally on the
//! 2D map instead of keeping a separate buffer per floor. Each band owns its
//! own three face layers, so after the shift a square is addressed by
//! `(physical x, physical y, layer)` and bands never share a layer.

use std::ops::Range;

use wg_core::constants::{FLOOR_COUNT, LAYERS_PER_FLOOR, MAX_UPPER_FLOOR, UPPER_FLOOR_BASE};
use wg_core::types::Location;

/// Square offsets applied to faces, smoothing, darkness and animations.
const FACE_OFFSETS: [(i32, i32); FLOOR_COUNT] =
    [(0, 0), (-1, 1), (-2, 2), (-3, 3), (1, -1), (2, -2), (3, -3)];

/// Square offsets applied to clear commands. Band 1 differs from the face
/// table; the server relies on this.
const CLEAR_OFFSETS: [(i32, i32); FLOOR_COUNT] =
    [(0, 0), (-1, 2), (-2, 2), (-3, 3), (1, -1), (2, -2), (3, -3)];

/// One of the seven floor bands: 0 is the ground floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloorBand(u8);

impl FloorBand {
    pub const GROUND: FloorBand = FloorBand(0);

    pub fn new(floor: u8) -> Option<Self> {
        ((floor as usize) < FLOOR_COUNT).then_some(Self(floor))
    }

    pub fn from_layer(layer: usize) -> Option<Self> {
        let floor = layer / LAYERS_PER_FLOOR;
        (floor < FLOOR_COUNT).then_some(Self(floor as u8))
    }

    /// Maps the carve/erase numbering (upper floor 1..=3) onto bands 4..=6.
    pub fn from_upper_floor(upper: u8) -> Option<Self> {
        if upper == 0 || upper > MAX_UPPER_FLOOR {
            return None;
        }
        Some(Self(UPPER_FLOOR_BASE as u8 + upper))
    }

    pub fn all() -> impl Iterator<Item = FloorBand> {
        (0..FLOOR_COUNT as u8).map(FloorBand)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The face layers owned by this band.
    pub fn layers(self) -> Range<usize> {
        let start = self.index() * LAYERS_PER_FLOOR;
        start..start + LAYERS_PER_FLOOR
    }

    pub fn offset(self) -> (i32, i32) {
        FACE_OFFSETS[self.index()]
    }

    pub fn clear_offset(self) -> (i32, i32) {
        CLEAR_OFFSETS[self.index()]
    }

    /// Physical square for a logical square on this band. `None` when the
    /// shift leaves the coordinate range.
    pub fn remap(self, x: i32, y: i32) -> Option<(i32, i32)> {
        shift(x, y, self.offset())
    }

    /// Physical square targeted by a clear command for a logical square on
    /// this band.
    pub fn remap_clear(self, x: i32, y: i32) -> Option<(i32, i32)> {
        shift(x, y, self.clear_offset())
    }

    /// Logical square whose faces land on physical `(x, y)`.
    pub fn unmap(self, x: i32, y: i32) -> Option<(i32, i32)> {
        let (dx, dy) = self.offset();
        Some((x.checked_sub(dx)?, y.checked_sub(dy)?))
    }
}

/// Largest distance, in squares, between a logical square and the physical
/// square it is drawn on.
pub const MAX_REMAP_OFFSET: i32 = 3;

fn shift(x: i32, y: i32, (dx, dy): (i32, i32)) -> Option<(i32, i32)> {
    Some((x.checked_add(dx)?, y.checked_add(dy)?))
}

impl std::fmt::Display for FloorBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "floor {}", self.0)
    }
}

/// Physical location of a protocol location: the band is taken from the
/// layer. Returns `None` for layers outside the layer range and for squares
/// shifted out of the coordinate range.
pub fn remap_location(location: Location) -> Option<(FloorBand, Location)> {
    let band = FloorBand::from_layer(location.layer)?;
    let (x, y) = band.remap(location.x, location.y)?;
    Some((band, Location::new(x, y, location.layer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wg_core::constants::NUM_LAYERS;

    #[test]
    fn ground_floor_is_identity() {
        assert_eq!(FloorBand::GROUND.remap(5, 7), Some((5, 7)));
        assert_eq!(FloorBand::GROUND.remap_clear(5, 7), Some((5, 7)));
    }

    #[test]
    fn lower_bands_shift_down_left_and_upper_bands_up_right() {
        let b1 = FloorBand::new(1).unwrap();
        let b3 = FloorBand::new(3).unwrap();
        let b4 = FloorBand::new(4).unwrap();
        let b6 = FloorBand::new(6).unwrap();
        assert_eq!(b1.remap(5, 5), Some((4, 6)));
        assert_eq!(b3.remap(5, 5), Some((2, 8)));
        assert_eq!(b4.remap(5, 5), Some((6, 4)));
        assert_eq!(b6.remap(5, 5), Some((8, 2)));
    }

    #[test]
    fn clear_table_differs_only_on_band_one() {
        for band in FloorBand::all() {
            if band.index() == 1 {
                assert_eq!(band.clear_offset(), (-1, 2));
            } else {
                assert_eq!(band.clear_offset(), band.offset());
            }
        }
    }

    #[test]
    fn bands_own_disjoint_layer_ranges_covering_all_layers() {
        let mut seen = [false; NUM_LAYERS];
        for band in FloorBand::all() {
            for layer in band.layers() {
                assert!(!seen[layer]);
                seen[layer] = true;
                assert_eq!(FloorBand::from_layer(layer), Some(band));
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(FloorBand::new(7), None);
        assert_eq!(FloorBand::from_layer(NUM_LAYERS), None);
        assert_eq!(FloorBand::from_upper_floor(0), None);
        assert_eq!(FloorBand::from_upper_floor(4), None);
        assert_eq!(FloorBand::from_upper_floor(1), FloorBand::new(4));
        assert_eq!(FloorBand::from_upper_floor(3), FloorBand::new(6));
    }

    #[test]
    fn remap_location_is_deterministic() {
        let loc = Location::new(3, 3, 13);
        let first = remap_location(loc);
        let second = remap_location(loc);
        assert_eq!(first, second);
        assert_eq!(
            first,
            Some((FloorBand::new(4).unwrap(), Location::new(4, 2, 13)))
        );
        assert_eq!(remap_location(Location::new(0, 0, 21)), None);
    }

    #[test]
    fn shifts_past_the_coordinate_range_are_dropped() {
        let b4 = FloorBand::new(4).unwrap();
        let b1 = FloorBand::new(1).unwrap();
        assert_eq!(b4.remap(i32::MAX, 0), None);
        assert_eq!(b4.remap(0, i32::MIN), None);
        assert_eq!(b1.remap_clear(0, i32::MAX - 1), None);
        assert_eq!(remap_location(Location::new(i32::MAX, 0, 12)), None);
        assert_eq!(FloorBand::GROUND.remap(i32::MAX, i32::MIN), Some((i32::MAX, i32::MIN)));
    }

    #[test]
    fn unmap_inverts_the_face_offsets() {
        for band in FloorBand::all() {
            let (px, py) = band.remap(6, 6).unwrap();
            assert_eq!(band.unmap(px, py), Some((6, 6)));
        }
        assert_eq!(FloorBand::new(1).unwrap().unmap(i32::MAX, 0), None);
    }

    #[test]
    fn remap_offsets_stay_within_the_margin() {
        for band in FloorBand::all() {
            for (dx, dy) in [band.offset(), band.clear_offset()] {
                assert!(dx.abs() <= MAX_REMAP_OFFSET && dy.abs() <= MAX_REMAP_OFFSET);
            }
        }
    }
}
