//! Client-side grid of visible map squares.
//!
//! Coordinates are physical: floor-band remapping has already been applied by
//! the caller. Writes outside the grid are dropped silently since remapped
//! upper-floor squares routinely land just outside the visible window.

use std::collections::{BTreeSet, HashMap};

use wg_core::constants::{DEFAULT_DARKNESS, DEFAULT_SMOOTH, FACE_COLOR_MASK, FLOOR_COUNT, NUM_LAYERS};
use wg_core::types::Face;

use crate::floor::FloorBand;

/// A square position inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapPos {
    pub x: usize,
    pub y: usize,
}

impl MapPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// One map square: per-layer faces and smoothing, per-band darkness and the
/// magic map colour overlay.
///
/// A band in fog of war still shows what was last seen there, but the server
/// has not confirmed it since the view moved. The next face written to the
/// band replaces everything else the band held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSquare {
    faces: [Option<Face>; NUM_LAYERS],
    smooth: [u8; NUM_LAYERS],
    darkness: [u8; FLOOR_COUNT],
    color: Option<u8>,
    fog_of_war: [bool; FLOOR_COUNT],
}

impl Default for MapSquare {
    fn default() -> Self {
        Self {
            faces: [None; NUM_LAYERS],
            smooth: [DEFAULT_SMOOTH; NUM_LAYERS],
            darkness: [DEFAULT_DARKNESS; FLOOR_COUNT],
            color: None,
            fog_of_war: [false; FLOOR_COUNT],
        }
    }
}

impl MapSquare {
    pub fn face(&self, layer: usize) -> Option<Face> {
        self.faces.get(layer).copied().flatten()
    }

    pub fn faces(&self) -> &[Option<Face>; NUM_LAYERS] {
        &self.faces
    }

    pub fn smooth(&self, layer: usize) -> u8 {
        self.smooth.get(layer).copied().unwrap_or(DEFAULT_SMOOTH)
    }

    pub fn darkness(&self, band: FloorBand) -> u8 {
        self.darkness[band.index()]
    }

    pub fn color(&self) -> Option<u8> {
        self.color
    }

    pub fn is_fog_of_war(&self, band: FloorBand) -> bool {
        self.fog_of_war[band.index()]
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn clear_floor(&mut self, band: FloorBand) {
        for layer in band.layers() {
            self.faces[layer] = None;
            self.smooth[layer] = DEFAULT_SMOOTH;
        }
        self.darkness[band.index()] = DEFAULT_DARKNESS;
        self.fog_of_war[band.index()] = false;
        if band == FloorBand::GROUND {
            self.color = None;
        }
    }

    /// Puts a band that still shows something into fog of war.
    fn fog_floor(&mut self, band: FloorBand) {
        let shows_something = self.darkness[band.index()] != DEFAULT_DARKNESS
            || band.layers().any(|layer| self.faces[layer].is_some());
        if shows_something {
            self.fog_of_war[band.index()] = true;
        }
    }

    /// Lifts the fog of a band, dropping its stale faces and darkness.
    /// Returns whether the band was fogged.
    fn drop_stale_floor(&mut self, band: FloorBand) -> bool {
        if !std::mem::take(&mut self.fog_of_war[band.index()]) {
            return false;
        }
        for layer in band.layers() {
            self.faces[layer] = None;
        }
        self.darkness[band.index()] = DEFAULT_DARKNESS;
        true
    }
}

#[derive(Debug, Default)]
pub struct GameMap {
    width: usize,
    height: usize,
    squares: Vec<MapSquare>,
    dirty: BTreeSet<MapPos>,
    /// Accumulated scroll offset of the view since the last reset.
    origin: (i32, i32),
    /// Layers waiting for a face the face cache did not know yet.
    pending_faces: HashMap<(MapPos, usize), u32>,
}

impl GameMap {
    pub fn new(width: usize, height: usize) -> Self {
        let mut map = Self::default();
        map.reset(width, height);
        map
    }

    /// Drops all square contents, dirty state and pending faces and resizes
    /// the grid.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.squares.clear();
        self.squares.resize(width * height, MapSquare::default());
        self.dirty.clear();
        self.pending_faces.clear();
        self.origin = (0, 0);
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    #[inline]
    fn pos(&self, x: i32, y: i32) -> Option<MapPos> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then_some(MapPos { x, y })
    }

    #[inline]
    fn index(&self, pos: MapPos) -> usize {
        pos.x + pos.y * self.width
    }

    pub fn square(&self, x: i32, y: i32) -> Option<&MapSquare> {
        self.pos(x, y).map(|pos| &self.squares[self.index(pos)])
    }

    pub fn square_at(&self, pos: MapPos) -> Option<&MapSquare> {
        self.square(pos.x as i32, pos.y as i32)
    }

    pub fn face(&self, x: i32, y: i32, layer: usize) -> Option<Face> {
        self.square(x, y).and_then(|square| square.face(layer))
    }

    pub fn smooth(&self, x: i32, y: i32, layer: usize) -> u8 {
        self.square(x, y)
            .map_or(DEFAULT_SMOOTH, |square| square.smooth(layer))
    }

    pub fn darkness(&self, x: i32, y: i32, band: FloorBand) -> u8 {
        self.square(x, y)
            .map_or(DEFAULT_DARKNESS, |square| square.darkness(band))
    }

    pub fn color(&self, x: i32, y: i32) -> Option<u8> {
        self.square(x, y).and_then(|square| square.color())
    }

    /// Iterates the squares of a rectangle clipped to the grid.
    pub fn iter_region(
        &self,
        min_x: usize,
        min_y: usize,
        width: usize,
        height: usize,
    ) -> impl Iterator<Item = (MapPos, &MapSquare)> {
        let max_x = (min_x + width).min(self.width);
        let max_y = (min_y + height).min(self.height);

        (min_y..max_y).flat_map(move |y| {
            (min_x..max_x).map(move |x| {
                let pos = MapPos { x, y };
                (pos, &self.squares[self.index(pos)])
            })
        })
    }

    fn square_mut(&mut self, x: i32, y: i32) -> Option<(MapPos, &mut MapSquare)> {
        let pos = self.pos(x, y)?;
        let idx = self.index(pos);
        Some((pos, &mut self.squares[idx]))
    }

    pub fn mark_dirty(&mut self, x: i32, y: i32) {
        if let Some(pos) = self.pos(x, y) {
            self.dirty.insert(pos);
        }
    }

    /// Sets or clears one layer of one square. Returns whether the square is
    /// inside the grid.
    pub fn set_face(&mut self, x: i32, y: i32, layer: usize, face: Option<Face>) -> bool {
        debug_assert!(layer < NUM_LAYERS, "layer {layer} out of range");
        if layer >= NUM_LAYERS {
            return false;
        }
        let Some(band) = FloorBand::from_layer(layer) else {
            return false;
        };
        let Some((pos, square)) = self.square_mut(x, y) else {
            return false;
        };
        let stale = square.drop_stale_floor(band);
        square.faces[layer] = face;
        if stale {
            let layers = band.layers();
            self.pending_faces
                .retain(|(p, l), _| *p != pos || !layers.contains(l));
        } else {
            self.pending_faces.remove(&(pos, layer));
        }
        self.dirty.insert(pos);
        true
    }

    /// Clears a layer and remembers that it should show `face_num` once the
    /// face becomes known.
    pub fn set_pending_face(&mut self, x: i32, y: i32, layer: usize, face_num: u32) -> bool {
        if !self.set_face(x, y, layer, None) {
            return false;
        }
        if let Some(pos) = self.pos(x, y) {
            self.pending_faces.insert((pos, layer), face_num);
        }
        true
    }

    pub fn pending_face(&self, x: i32, y: i32, layer: usize) -> Option<u32> {
        let pos = self.pos(x, y)?;
        self.pending_faces.get(&(pos, layer)).copied()
    }

    /// Sets the smoothing value of one layer. A changed value also dirties the
    /// eight neighbours, which blend with this square.
    pub fn set_smooth(&mut self, x: i32, y: i32, layer: usize, smooth: u8) -> bool {
        debug_assert!(layer < NUM_LAYERS, "layer {layer} out of range");
        if layer >= NUM_LAYERS {
            return false;
        }
        let Some((pos, square)) = self.square_mut(x, y) else {
            return false;
        };
        let changed = square.smooth[layer] != smooth;
        square.smooth[layer] = smooth;
        if let Some(band) = FloorBand::from_layer(layer) {
            square.fog_of_war[band.index()] = false;
        }
        self.dirty.insert(pos);

        if changed {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    self.mark_dirty(x.saturating_add(dx), y.saturating_add(dy));
                }
            }
        }
        true
    }

    pub fn set_darkness(&mut self, x: i32, y: i32, band: FloorBand, darkness: u8) -> bool {
        let Some((pos, square)) = self.square_mut(x, y) else {
            return false;
        };
        square.darkness[band.index()] = darkness;
        square.fog_of_war[band.index()] = false;
        self.dirty.insert(pos);
        true
    }

    /// Applies magic map rows starting at `(x0, y0)`; `rows[dy][dx]` colours
    /// square `(x0 + dx, y0 + dy)`. Colouring a fogged square forgets its
    /// stale faces.
    pub fn set_magic_map(&mut self, x0: i32, y0: i32, rows: &[Vec<u8>]) {
        for (dy, row) in rows.iter().enumerate() {
            let Some(y) = i32::try_from(dy).ok().and_then(|dy| y0.checked_add(dy)) else {
                break;
            };
            for (dx, value) in row.iter().enumerate() {
                let Some(x) = i32::try_from(dx).ok().and_then(|dx| x0.checked_add(dx)) else {
                    break;
                };
                let Some((pos, square)) = self.square_mut(x, y) else {
                    continue;
                };
                square.color = Some(value & FACE_COLOR_MASK);
                let stale = std::mem::take(&mut square.fog_of_war[FloorBand::GROUND.index()]);
                if stale {
                    square.faces = [None; NUM_LAYERS];
                    self.pending_faces.retain(|(p, _), _| *p != pos);
                }
                self.dirty.insert(pos);
            }
        }
    }

    /// Clears every layer and overlay of one square.
    pub fn clear_square(&mut self, x: i32, y: i32) -> bool {
        let Some((pos, square)) = self.square_mut(x, y) else {
            return false;
        };
        square.clear();
        self.pending_faces.retain(|(p, _), _| *p != pos);
        self.dirty.insert(pos);
        true
    }

    /// Clears the layers, smoothing and darkness of one floor band of one
    /// square. Clearing the ground floor also drops the magic map colour.
    pub fn clear_floor(&mut self, x: i32, y: i32, band: FloorBand) -> bool {
        let Some((pos, square)) = self.square_mut(x, y) else {
            return false;
        };
        square.clear_floor(band);
        let layers = band.layers();
        self.pending_faces
            .retain(|(p, layer), _| *p != pos || !layers.contains(layer));
        self.dirty.insert(pos);
        true
    }

    pub fn dirty_squares(&self) -> &BTreeSet<MapPos> {
        &self.dirty
    }

    /// Returns the squares changed since the last call and starts a new set.
    pub fn take_dirty_squares(&mut self) -> BTreeSet<MapPos> {
        std::mem::take(&mut self.dirty)
    }

    /// Moves the view by `(dx, dy)` squares. Square contents move the other
    /// way; squares that scroll out are dropped and newly exposed squares
    /// start empty and dirty. Every band that still shows something after
    /// the move is put into fog of war; scroll listeners redraw the whole
    /// view, so fogging alone does not dirty a square.
    ///
    /// Returns `true` when the scroll exceeded the view and the whole grid
    /// was cleared.
    pub fn process_map_scroll(&mut self, dx: i32, dy: i32, view_width: usize, view_height: usize) -> bool {
        if dx == 0 && dy == 0 {
            return false;
        }

        self.origin = (self.origin.0.wrapping_add(dx), self.origin.1.wrapping_add(dy));

        if dx.unsigned_abs() as usize >= view_width || dy.unsigned_abs() as usize >= view_height {
            for square in self.squares.iter_mut() {
                square.clear();
            }
            self.pending_faces.clear();
            self.dirty = self.all_positions().collect();
            return true;
        }

        self.shift_rows(dy);
        self.shift_columns(dx);
        for square in self.squares.iter_mut() {
            for band in FloorBand::all() {
                square.fog_floor(band);
            }
        }

        let (width, height) = (self.width as i32, self.height as i32);
        let moved = |pos: MapPos| -> Option<MapPos> {
            let x = pos.x as i32 - dx;
            let y = pos.y as i32 - dy;
            (x >= 0 && y >= 0 && x < width && y < height).then(|| MapPos::new(x as usize, y as usize))
        };

        let mut dirty: BTreeSet<MapPos> = self.dirty.iter().copied().filter_map(moved).collect();
        for pos in self.all_positions() {
            let x = pos.x as i32 + dx;
            let y = pos.y as i32 + dy;
            if x < 0 || y < 0 || x >= width || y >= height {
                dirty.insert(pos);
            }
        }
        self.dirty = dirty;

        self.pending_faces = std::mem::take(&mut self.pending_faces)
            .into_iter()
            .filter_map(|((pos, layer), face_num)| moved(pos).map(|p| ((p, layer), face_num)))
            .collect();

        false
    }

    fn shift_rows(&mut self, dy: i32) {
        let width = self.width;
        let len = self.squares.len();
        let rows = dy.unsigned_abs() as usize;
        if dy == 0 || width == 0 {
            return;
        }
        let shift = (rows * width).min(len);
        if dy > 0 {
            self.squares.copy_within(shift..len, 0);
            self.squares[len - shift..].fill(MapSquare::default());
        } else {
            self.squares.copy_within(0..len - shift, shift);
            self.squares[..shift].fill(MapSquare::default());
        }
    }

    fn shift_columns(&mut self, dx: i32) {
        let width = self.width;
        let cols = (dx.unsigned_abs() as usize).min(width);
        if dx == 0 || width == 0 {
            return;
        }
        for row in self.squares.chunks_mut(width) {
            if dx > 0 {
                row.copy_within(cols..width, 0);
                row[width - cols..].fill(MapSquare::default());
            } else {
                row.copy_within(0..width - cols, cols);
                row[..cols].fill(MapSquare::default());
            }
        }
    }

    fn all_positions(&self) -> impl Iterator<Item = MapPos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| MapPos { x, y }))
    }

    /// Rewrites every visible layer showing `face.face_num` and fills layers
    /// that were waiting for it. Returns the number of layers touched.
    pub fn update_face(&mut self, face: Face, view_width: usize, view_height: usize) -> usize {
        let mut updated = 0;
        let max_x = view_width.min(self.width);
        let max_y = view_height.min(self.height);

        for y in 0..max_y {
            for x in 0..max_x {
                let pos = MapPos { x, y };
                let idx = self.index(pos);
                let square = &mut self.squares[idx];
                let mut touched = false;
                for slot in square.faces.iter_mut() {
                    if slot.is_some_and(|f| f.face_num == face.face_num) {
                        *slot = Some(face);
                        touched = true;
                        updated += 1;
                    }
                }
                if touched {
                    self.dirty.insert(pos);
                }
            }
        }

        let waiting: Vec<(MapPos, usize)> = self
            .pending_faces
            .iter()
            .filter(|(_, face_num)| **face_num == face.face_num)
            .map(|(key, _)| *key)
            .collect();
        for (pos, layer) in waiting {
            self.pending_faces.remove(&(pos, layer));
            let idx = self.index(pos);
            self.squares[idx].faces[layer] = Some(face);
            self.dirty.insert(pos);
            updated += 1;
        }

        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(n: u8) -> FloorBand {
        FloorBand::new(n).unwrap()
    }

    #[test]
    fn reset_leaves_every_square_empty() {
        let mut map = GameMap::new(4, 3);
        map.set_face(1, 1, 0, Some(Face::new(9)));
        map.set_darkness(2, 2, band(0), 10);
        map.set_smooth(0, 0, 5, 3);
        map.reset(5, 5);

        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 5);
        assert!(map.dirty_squares().is_empty());
        for (_, square) in map.iter_region(0, 0, 5, 5) {
            assert!(square.is_empty());
        }
        for layer in 0..NUM_LAYERS {
            assert_eq!(map.face(1, 1, layer), None);
            assert_eq!(map.smooth(0, 0, layer), DEFAULT_SMOOTH);
        }
        for b in FloorBand::all() {
            assert_eq!(map.darkness(2, 2, b), DEFAULT_DARKNESS);
        }
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut map = GameMap::new(3, 3);
        assert!(!map.set_face(-1, 0, 0, Some(Face::new(1))));
        assert!(!map.set_face(3, 0, 0, Some(Face::new(1))));
        assert!(!map.set_darkness(0, 7, band(0), 1));
        assert!(!map.clear_square(9, 9));
        map.set_magic_map(2, 2, &[vec![1, 2], vec![3, 4]]);
        assert!(map.take_dirty_squares().into_iter().eq([MapPos::new(2, 2)]));
        assert_eq!(map.color(2, 2), Some(1));
    }

    #[test]
    fn dirty_set_holds_exactly_the_touched_squares() {
        let mut map = GameMap::new(5, 5);
        map.set_face(1, 2, 0, Some(Face::new(1)));
        map.set_face(1, 2, 1, Some(Face::new(2)));
        map.clear_square(4, 4);

        let dirty = map.take_dirty_squares();
        assert_eq!(
            dirty.into_iter().collect::<Vec<_>>(),
            vec![MapPos::new(1, 2), MapPos::new(4, 4)]
        );
        assert!(map.take_dirty_squares().is_empty());
    }

    #[test]
    fn changed_smoothing_dirties_neighbours() {
        let mut map = GameMap::new(5, 5);
        map.set_smooth(2, 2, 0, 4);
        assert_eq!(map.take_dirty_squares().len(), 9);

        map.set_smooth(2, 2, 0, 4);
        assert!(map.take_dirty_squares().into_iter().eq([MapPos::new(2, 2)]));

        map.set_smooth(0, 0, 0, 1);
        assert_eq!(map.take_dirty_squares().len(), 4);
    }

    #[test]
    fn magic_map_masks_colour_bits() {
        let mut map = GameMap::new(4, 4);
        map.set_magic_map(1, 0, &[vec![0xF3, 0x41]]);
        assert_eq!(map.color(1, 0), Some(0x03));
        assert_eq!(map.color(2, 0), Some(0x01));
        assert_eq!(map.color(0, 0), None);
    }

    #[test]
    fn clear_floor_only_touches_that_band() {
        let mut map = GameMap::new(4, 4);
        map.set_face(1, 1, 0, Some(Face::new(1)));
        map.set_face(1, 1, 4, Some(Face::new(2)));
        map.set_darkness(1, 1, band(1), 30);

        map.clear_floor(1, 1, band(1));
        assert_eq!(map.face(1, 1, 0), Some(Face::new(1)));
        assert_eq!(map.face(1, 1, 4), None);
        assert_eq!(map.darkness(1, 1, band(1)), DEFAULT_DARKNESS);

        map.clear_square(1, 1);
        assert!(map.square(1, 1).unwrap().is_empty());
    }

    #[test]
    fn scroll_moves_contents_against_the_view() {
        let mut map = GameMap::new(4, 4);
        map.set_face(2, 2, 0, Some(Face::new(5)));
        map.set_face(0, 0, 0, Some(Face::new(6)));
        map.take_dirty_squares();

        assert!(!map.process_map_scroll(1, 1, 4, 4));
        assert_eq!(map.origin(), (1, 1));
        assert_eq!(map.face(1, 1, 0), Some(Face::new(5)));
        assert_eq!(map.face(2, 2, 0), None);
        assert_eq!(map.face(0, 0, 0), None);

        let dirty = map.take_dirty_squares();
        assert!(dirty.contains(&MapPos::new(3, 0)));
        assert!(dirty.contains(&MapPos::new(0, 3)));
        assert!(!dirty.contains(&MapPos::new(1, 1)));
        assert_eq!(dirty.len(), 7);
    }

    #[test]
    fn scroll_negative_direction_exposes_top_left() {
        let mut map = GameMap::new(3, 3);
        map.set_face(0, 0, 2, Some(Face::new(8)));
        map.take_dirty_squares();

        map.process_map_scroll(-1, 0, 3, 3);
        assert_eq!(map.face(1, 0, 2), Some(Face::new(8)));
        let dirty = map.take_dirty_squares();
        assert!(dirty.into_iter().eq([MapPos::new(0, 0), MapPos::new(0, 1), MapPos::new(0, 2)]));
    }

    #[test]
    fn scroll_zero_is_a_no_op() {
        let mut map = GameMap::new(3, 3);
        map.set_face(1, 1, 0, Some(Face::new(1)));
        map.take_dirty_squares();
        assert!(!map.process_map_scroll(0, 0, 3, 3));
        assert_eq!(map.origin(), (0, 0));
        assert_eq!(map.face(1, 1, 0), Some(Face::new(1)));
        assert!(map.dirty_squares().is_empty());
    }

    #[test]
    fn large_scroll_clears_everything() {
        let mut map = GameMap::new(3, 3);
        map.set_face(1, 1, 0, Some(Face::new(1)));
        assert!(map.process_map_scroll(3, 0, 3, 3));
        assert!(map.iter_region(0, 0, 3, 3).all(|(_, s)| s.is_empty()));
        assert_eq!(map.dirty_squares().len(), 9);
    }

    #[test]
    fn scroll_and_back_restores_origin() {
        let mut map = GameMap::new(6, 6);
        map.process_map_scroll(2, -1, 6, 6);
        map.process_map_scroll(-2, 1, 6, 6);
        assert_eq!(map.origin(), (0, 0));
    }

    #[test]
    fn update_face_refreshes_matching_layers_and_fills_pending() {
        let mut map = GameMap::new(4, 4);
        map.set_face(0, 0, 0, Some(Face::new(7)));
        map.set_pending_face(3, 3, 1, 7);
        map.set_face(1, 1, 0, Some(Face::new(8)));
        assert_eq!(map.pending_face(3, 3, 1), Some(7));
        map.take_dirty_squares();

        let loaded = Face::with_size(7, 2, 1);
        assert_eq!(map.update_face(loaded, 4, 4), 2);
        assert_eq!(map.face(0, 0, 0), Some(loaded));
        assert_eq!(map.face(3, 3, 1), Some(loaded));
        assert_eq!(map.pending_face(3, 3, 1), None);
        let dirty = map.take_dirty_squares();
        assert!(dirty.into_iter().eq([MapPos::new(0, 0), MapPos::new(3, 3)]));
    }

    #[test]
    fn overwriting_a_pending_layer_forgets_the_pending_face() {
        let mut map = GameMap::new(2, 2);
        map.set_pending_face(0, 0, 0, 11);
        map.set_face(0, 0, 0, Some(Face::new(12)));
        assert_eq!(map.update_face(Face::new(11), 2, 2), 0);
        assert_eq!(map.face(0, 0, 0), Some(Face::new(12)));
    }

    #[test]
    fn pending_faces_follow_scrolling() {
        let mut map = GameMap::new(4, 4);
        map.set_pending_face(2, 2, 0, 3);
        map.process_map_scroll(1, 0, 4, 4);
        assert_eq!(map.pending_face(1, 2, 0), Some(3));
        assert_eq!(map.pending_face(2, 2, 0), None);
    }

    #[test]
    fn scroll_fogs_bands_that_still_show_something() {
        let mut map = GameMap::new(4, 4);
        map.set_face(2, 1, 0, Some(Face::new(1)));
        map.set_face(2, 1, 1, Some(Face::new(2)));
        map.set_darkness(2, 1, band(1), 40);
        map.set_face(3, 3, 0, Some(Face::new(3)));

        map.process_map_scroll(1, 0, 4, 4);
        let square = map.square(1, 1).unwrap();
        assert!(square.is_fog_of_war(band(0)));
        assert!(square.is_fog_of_war(band(1)));
        assert!(!square.is_fog_of_war(band(2)));
        // stale data stays visible until overwritten
        assert_eq!(square.face(1), Some(Face::new(2)));
        assert_eq!(square.darkness(band(1)), 40);
        assert!(!map.square(0, 0).unwrap().is_fog_of_war(band(0)));
    }

    #[test]
    fn first_face_on_a_fogged_band_replaces_the_band() {
        let mut map = GameMap::new(4, 4);
        map.set_face(2, 1, 0, Some(Face::new(1)));
        map.set_face(2, 1, 1, Some(Face::new(2)));
        map.set_face(2, 1, 3, Some(Face::new(4)));
        map.set_pending_face(2, 1, 2, 9);
        map.set_darkness(2, 1, band(0), 40);
        map.process_map_scroll(1, 0, 4, 4);

        map.set_face(1, 1, 0, Some(Face::new(5)));
        let square = map.square(1, 1).unwrap();
        assert!(!square.is_fog_of_war(band(0)));
        assert_eq!(square.face(0), Some(Face::new(5)));
        assert_eq!(square.face(1), None);
        assert_eq!(square.darkness(band(0)), DEFAULT_DARKNESS);
        assert_eq!(map.pending_face(1, 1, 2), None);
        // other bands keep their own fog
        assert_eq!(square.face(3), Some(Face::new(4)));
        assert!(square.is_fog_of_war(band(1)));

        // a second write is an ordinary one
        map.set_face(1, 1, 1, Some(Face::new(6)));
        assert_eq!(map.face(1, 1, 0), Some(Face::new(5)));
    }

    #[test]
    fn darkness_and_smoothing_confirm_a_fogged_band() {
        let mut map = GameMap::new(4, 4);
        map.set_face(2, 2, 0, Some(Face::new(1)));
        map.set_face(2, 2, 3, Some(Face::new(2)));
        map.set_face(2, 2, 1, Some(Face::new(3)));
        map.process_map_scroll(1, 0, 4, 4);

        map.set_darkness(1, 2, band(1), 20);
        map.set_smooth(1, 2, 0, 2);
        let square = map.square(1, 2).unwrap();
        assert!(!square.is_fog_of_war(band(0)));
        assert!(!square.is_fog_of_war(band(1)));

        map.set_face(1, 2, 0, Some(Face::new(7)));
        assert_eq!(map.face(1, 2, 1), Some(Face::new(3)));
        assert_eq!(map.face(1, 2, 3), Some(Face::new(2)));
    }

    #[test]
    fn magic_map_on_a_fogged_square_drops_its_faces() {
        let mut map = GameMap::new(4, 4);
        map.set_face(2, 2, 0, Some(Face::new(1)));
        map.set_face(2, 2, 4, Some(Face::new(2)));
        map.set_face(3, 2, 0, Some(Face::new(3)));
        map.process_map_scroll(1, 0, 4, 4);
        map.set_face(2, 2, 0, Some(Face::new(3)));

        map.set_magic_map(1, 2, &[vec![1, 2]]);
        assert!(map.square(1, 2).unwrap().faces().iter().all(Option::is_none));
        assert_eq!(map.color(1, 2), Some(1));
        assert_eq!(map.face(2, 2, 0), Some(Face::new(3)));
    }

    #[test]
    fn clearing_a_floor_lifts_its_fog() {
        let mut map = GameMap::new(4, 4);
        map.set_face(2, 2, 0, Some(Face::new(1)));
        map.process_map_scroll(1, 0, 4, 4);
        map.clear_floor(1, 2, band(0));
        assert!(map.square(1, 2).unwrap().is_empty());
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let mut map = GameMap::new(3, 3);
        map.set_magic_map(i32::MAX, i32::MAX, &[vec![1, 2], vec![3]]);
        map.set_magic_map(-1, -1, &[vec![0, 0], vec![0, 5]]);
        assert_eq!(map.color(0, 0), Some(5));
        assert!(!map.set_smooth(i32::MAX, 0, 0, 1));

        map.process_map_scroll(i32::MAX, 0, 3, 3);
        map.process_map_scroll(i32::MAX, 0, 3, 3);
        assert_eq!(map.origin(), (i32::MAX.wrapping_add(i32::MAX), 0));
        assert!(map.process_map_scroll(i32::MIN, i32::MIN, 3, 3));
    }
}
