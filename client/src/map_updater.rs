//! Applies server map commands to the client map state.
//!
//! The updater is shared between the thread reading server packets, the
//! face cache loader and the animation tick scheduler. All of its state sits
//! behind one session lock. A packet's commands are applied through a
//! [`MapBatch`], which holds that lock from `map_begin` until `map_end`, so a
//! map mutation without the lock cannot be written.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wg_core::constants::MAX_UPPER_FLOOR;
use wg_core::types::{Face, Location};

use crate::animations::Animations;
use crate::faces::{FacesListener, FacesProvider};
use crate::floor::{remap_location, FloorBand, MAX_REMAP_OFFSET};
use crate::gui_state::GuiState;
use crate::listeners::{ListenerList, MapListener, MapScrollListener, MapSizeListener, NewMapListener};
use crate::map::GameMap;
use crate::visible_animations::{AnimationType, VisibleAnimations};

#[derive(Debug, Default)]
struct UpdaterState {
    map_width: usize,
    map_height: usize,
    map: GameMap,
    animations: Animations,
    visible: VisibleAnimations,
}

pub struct MapUpdater {
    state: Mutex<UpdaterState>,
    faces: Arc<dyn FacesProvider>,
    map_listeners: ListenerList<dyn MapListener>,
    new_map_listeners: ListenerList<dyn NewMapListener>,
    scroll_listeners: ListenerList<dyn MapScrollListener>,
    size_listeners: ListenerList<dyn MapSizeListener>,
}

impl MapUpdater {
    pub fn new(faces: Arc<dyn FacesProvider>) -> Self {
        Self {
            state: Mutex::new(UpdaterState::default()),
            faces,
            map_listeners: ListenerList::new(),
            new_map_listeners: ListenerList::new(),
            scroll_listeners: ListenerList::new(),
            size_listeners: ListenerList::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, UpdaterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log::error!("map updater state mutex poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    pub fn add_map_listener(&self, listener: Arc<dyn MapListener>) {
        self.map_listeners.add(listener);
    }

    pub fn remove_map_listener(&self, listener: &Arc<dyn MapListener>) -> bool {
        self.map_listeners.remove(listener)
    }

    pub fn add_new_map_listener(&self, listener: Arc<dyn NewMapListener>) {
        self.new_map_listeners.add(listener);
    }

    pub fn remove_new_map_listener(&self, listener: &Arc<dyn NewMapListener>) -> bool {
        self.new_map_listeners.remove(listener)
    }

    pub fn add_map_scroll_listener(&self, listener: Arc<dyn MapScrollListener>) {
        self.scroll_listeners.add(listener);
    }

    pub fn remove_map_scroll_listener(&self, listener: &Arc<dyn MapScrollListener>) -> bool {
        self.scroll_listeners.remove(listener)
    }

    pub fn add_map_size_listener(&self, listener: Arc<dyn MapSizeListener>) {
        self.size_listeners.add(listener);
    }

    pub fn remove_map_size_listener(&self, listener: &Arc<dyn MapSizeListener>) -> bool {
        self.size_listeners.remove(listener)
    }

    /// Starts a batch of map changes. The returned token holds the session
    /// lock until [`MapBatch::map_end`]. Dropping it without `map_end` keeps
    /// the changes for the next flush.
    pub fn map_begin(&self) -> MapBatch<'_> {
        MapBatch {
            updater: self,
            state: self.lock_state(),
        }
    }

    /// Switches to a new map. Size listeners only hear about actual size
    /// changes; new-map listeners are always notified.
    pub fn new_map(&self, width: usize, height: usize) {
        let mut state = self.lock_state();
        self.start_new_map(&mut state, width, height);
    }

    fn start_new_map(&self, state: &mut UpdaterState, width: usize, height: usize) {
        let changed = state.map_width != width || state.map_height != height;
        state.map_width = width;
        state.map_height = height;
        state.map.reset(width, height);
        state.visible.clear();
        state.visible.set_map_size(width, height);
        log::debug!("new map {width}x{height} (size changed: {changed})");

        if changed {
            self.size_listeners
                .for_each(|l| l.map_size_changed(width, height));
        }
        self.new_map_listeners.for_each(|l| l.new_map());
    }

    /// Clears map and animation state while keeping the map size.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        let (width, height) = (state.map_width, state.map_height);
        self.start_new_map(&mut state, width, height);
    }

    /// Defines an animation; see [`Animations::add_animation`].
    pub fn add_animation(&self, animation_id: u16, flags: u16, faces: &[u32]) {
        self.lock_state()
            .animations
            .add_animation(animation_id, flags, faces);
    }

    /// Advances all visible animations by one game tick and flushes the
    /// resulting face changes to the map listeners.
    pub fn tick(&self, tick_no: u32) {
        let mut batch = self.map_begin();
        let changes = batch.state.visible.tick(tick_no);
        for (location, face_num) in changes {
            batch.apply_face(location, face_num);
        }
        batch.map_end(false);
    }

    pub fn gui_state_changed(&self, gui_state: &GuiState) {
        let mut state = self.lock_state();
        if gui_state.resets_animations() {
            state.animations.clear();
        }
        if gui_state.resets_map() {
            log::debug!("resetting map for {gui_state:?}");
            let (width, height) = (state.map_width, state.map_height);
            self.start_new_map(&mut state, width, height);
        }
    }

    pub fn map_size(&self) -> (usize, usize) {
        let state = self.lock_state();
        (state.map_width, state.map_height)
    }

    pub fn map_width(&self) -> usize {
        self.map_size().0
    }

    pub fn map_height(&self) -> usize {
        self.map_size().1
    }

    /// Runs `f` against a consistent view of the map. Keep `f` short: it
    /// blocks packet processing while it runs.
    pub fn with_map<R>(&self, f: impl FnOnce(&GameMap) -> R) -> R {
        f(&self.lock_state().map)
    }

    pub fn visible_animation_count(&self) -> usize {
        self.lock_state().visible.len()
    }

    pub fn animation_count(&self) -> usize {
        self.lock_state().animations.len()
    }
}

impl FacesListener for MapUpdater {
    /// Rewrites the visible squares showing `face` and flushes unconditionally.
    fn face_updated(&self, face: &Face) {
        let face = Face {
            face_num: face.map_face_num(),
            top_part: false,
            ..*face
        };
        let mut batch = self.map_begin();
        let (width, height) = (batch.state.map_width, batch.state.map_height);
        let updated = batch.state.map.update_face(face, width, height);
        log::trace!("face {} updated on {updated} layers", face.face_num);
        batch.map_end(true);
    }
}

/// Lock token for one batch of map changes.
pub struct MapBatch<'a> {
    updater: &'a MapUpdater,
    state: MutexGuard<'a, UpdaterState>,
}

impl MapBatch<'_> {
    /// Read access to the map inside the batch.
    pub fn map(&self) -> &GameMap {
        &self.state.map
    }

    /// Sets a face and stops any animation at `location`.
    pub fn map_face(&mut self, location: Location, face_num: u32) {
        self.map_face_with(location, face_num, true);
    }

    /// Sets a face; face 0 clears the layer.
    pub fn map_face_with(&mut self, location: Location, face_num: u32, clear_animation: bool) {
        if clear_animation {
            self.state.visible.remove(&location);
        }
        self.apply_face(location, face_num);
    }

    fn apply_face(&mut self, location: Location, face_num: u32) {
        let Some((_, physical)) = remap_location(location) else {
            log::warn!("face {face_num} for invalid layer or off-map square {location}, ignoring");
            return;
        };
        let (x, y, layer) = (physical.x, physical.y, physical.layer);

        if face_num == 0 {
            self.state.map.set_face(x, y, layer, None);
            return;
        }
        match self.updater.faces.face(face_num) {
            Some(face) => {
                self.state.map.set_face(x, y, layer, Some(face));
            }
            None => {
                log::debug!("face {face_num} not loaded yet, pending at {location}");
                self.state.map.set_pending_face(x, y, layer, face_num);
            }
        }
    }

    /// Starts an animation at `location`. Unknown animation ids are logged
    /// and ignored.
    pub fn map_animation(&mut self, location: Location, animation_id: u16, animation_type: u8) {
        let Some(animation) = self.state.animations.get(animation_id) else {
            log::warn!("unknown animation id {animation_id}, ignoring");
            return;
        };
        let Some((_, physical)) = remap_location(location) else {
            log::warn!("animation {animation_id} for invalid layer or off-map square {location}, ignoring");
            return;
        };

        self.state
            .map
            .set_face(physical.x, physical.y, physical.layer, None);
        let kind = AnimationType::from_protocol(animation_type);
        let face_num = self.state.visible.add(location, animation, kind);
        self.apply_face(location, face_num);
    }

    pub fn map_animation_speed(&mut self, location: Location, speed: u32) {
        if !self.state.visible.update_speed(&location, speed) {
            log::trace!("no animation at {location} for speed {speed}");
        }
    }

    pub fn map_smooth(&mut self, location: Location, smooth: u8) {
        let Some((_, physical)) = remap_location(location) else {
            log::warn!("smoothing for invalid layer or off-map square {location}, ignoring");
            return;
        };
        self.state
            .map
            .set_smooth(physical.x, physical.y, physical.layer, smooth);
    }

    pub fn map_darkness(&mut self, x: i32, y: i32, darkness: u8, floor: u8) {
        let Some(band) = FloorBand::new(floor) else {
            log::warn!("darkness for invalid floor {floor} at ({x}, {y}), ignoring");
            return;
        };
        let Some((px, py)) = band.remap(x, y) else {
            log::trace!("darkness at ({x}, {y}) on floor {floor} is off the map");
            return;
        };
        self.state.map.set_darkness(px, py, band, darkness);
    }

    /// Applies a block of magic map colours with its top left at `(x, y)`.
    pub fn magic_map(&mut self, x: i32, y: i32, rows: &[Vec<u8>]) {
        self.state.map.set_magic_map(x, y, rows);
    }

    /// Clears one floor band of a logical square. Animations drawing onto the
    /// cleared square stop as well.
    pub fn map_clear(&mut self, x: i32, y: i32, floor: u8) {
        let Some(band) = FloorBand::new(floor) else {
            log::warn!("clear for invalid floor {floor} at ({x}, {y}), ignoring");
            return;
        };
        let Some((px, py)) = band.remap_clear(x, y) else {
            log::trace!("clear at ({x}, {y}) on floor {floor} is off the map");
            return;
        };
        // band 1 clears one row below where its faces land, so the animation
        // owning the cleared square is not necessarily the one at (x, y)
        if let Some((lx, ly)) = band.unmap(px, py) {
            self.state.visible.remove_floor(lx, ly, band);
        }
        self.state.map.clear_floor(px, py, band);
    }

    /// Scrolls the view. Scroll listeners are notified right away rather than
    /// at `map_end`.
    pub fn map_scroll(&mut self, dx: i32, dy: i32) {
        let state = &mut *self.state;
        let cleared = state
            .map
            .process_map_scroll(dx, dy, state.map_width, state.map_height);
        if cleared {
            state.visible.clear();
        } else {
            state.visible.scroll(dx, dy);
        }

        self.updater
            .scroll_listeners
            .for_each(|l| l.map_scrolled(dx, dy));
    }

    /// Erases upper-floor faces left behind in the part of the view exposed
    /// by a scroll of `(dx, dy)`. Upper floors 1 and 2 are carved once
    /// `max_floor` reaches them; the top floor only when `max_floor` names it
    /// exactly.
    pub fn carve_viewpoint(&mut self, dx: i32, dy: i32, max_floor: u8) {
        if max_floor > MAX_UPPER_FLOOR {
            log::warn!("carve for max floor {max_floor} above {MAX_UPPER_FLOOR}, top floor left alone");
        }
        let bands: Vec<FloorBand> = (1..=MAX_UPPER_FLOOR)
            .filter(|&upper| {
                if upper == MAX_UPPER_FLOOR {
                    max_floor == upper
                } else {
                    max_floor >= upper
                }
            })
            .filter_map(FloorBand::from_upper_floor)
            .collect();
        if bands.is_empty() {
            return;
        }

        let width = self.state.map_width as i32;
        let height = self.state.map_height as i32;
        let (cx, cy) = (width / 2, height / 2);
        // logical squares further out never remap onto the grid
        let right = cx.saturating_add(dx).min(width.saturating_add(MAX_REMAP_OFFSET + 1));
        let top = cy.saturating_add(dy).max(-MAX_REMAP_OFFSET - 2);

        if dx > 0 {
            for px in cx..right {
                for y in cy..height {
                    self.erase_upper(px - 1, y, &bands);
                }
            }
        }
        if dy < 0 {
            for py in top..cy {
                for x in 0..=cx {
                    self.erase_upper(x, py + 2, &bands);
                }
            }
        }
        if dx > 0 && dy < 0 {
            for py in top..cy {
                for px in cx..right {
                    self.erase_upper(px - 1, py + 2, &bands);
                }
            }
        }
    }

    /// Clears the faces of upper floor `upper_floor` (1..=3) on every visible
    /// square.
    pub fn erase_floor(&mut self, upper_floor: u8) {
        let Some(band) = FloorBand::from_upper_floor(upper_floor) else {
            log::warn!("erase for invalid upper floor {upper_floor}, ignoring");
            return;
        };
        let width = self.state.map_width as i32;
        let height = self.state.map_height as i32;
        for y in 0..height {
            for x in 0..width {
                self.erase_upper(x, y, &[band]);
            }
        }
    }

    fn erase_upper(&mut self, x: i32, y: i32, bands: &[FloorBand]) {
        let state = &mut *self.state;
        for band in bands {
            let physical = band.remap(x, y);
            for layer in band.layers() {
                state.visible.remove(&Location::new(x, y, layer));
                if let Some((px, py)) = physical {
                    state.map.set_face(px, py, layer, None);
                }
            }
        }
    }

    /// Ends the batch. Map listeners get every square changed since the last
    /// flush, once. With no changes they are only called if
    /// `always_process` is set.
    pub fn map_end(self, always_process: bool) {
        let MapBatch { updater, mut state } = self;
        let squares = state.map.take_dirty_squares();
        if !always_process && squares.is_empty() {
            return;
        }

        log::trace!("map batch done, {} squares changed", squares.len());
        updater
            .map_listeners
            .for_each(|l| l.map_changed(&state.map, &squares));
    }
}
