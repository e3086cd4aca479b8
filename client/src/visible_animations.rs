//! Animations currently playing on visible map squares.

use std::collections::HashMap;
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use wg_core::types::Location;

use crate::animations::Animation;
use crate::floor::FloorBand;

/// Playback type sent along with a map animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationType {
    /// Starts at the first frame.
    Normal,
    /// Starts at a random frame so neighbouring squares do not move in step.
    Randomize,
    /// All instances of an animation show the same frame.
    Synchronize,
}

impl AnimationType {
    pub fn from_protocol(value: u8) -> Self {
        match value {
            0 => AnimationType::Normal,
            1 => AnimationType::Randomize,
            2 => AnimationType::Synchronize,
            other => {
                log::warn!("unknown animation type {other}, playing as normal");
                AnimationType::Normal
            }
        }
    }
}

/// Playback cursor of one animation instance.
#[derive(Debug, Clone)]
pub struct AnimationState {
    animation: Arc<Animation>,
    kind: AnimationType,
    /// Ticks per frame; 0 holds the current frame.
    speed: u32,
    delay: u32,
    frame: usize,
}

impl AnimationState {
    fn new(animation: Arc<Animation>, kind: AnimationType, tick_no: u32, rng: &mut StdRng) -> Self {
        let frame = match kind {
            AnimationType::Normal => 0,
            AnimationType::Randomize => rng.gen_range(0..animation.face_count()),
            AnimationType::Synchronize => synchronized_frame(&animation, 1, tick_no),
        };
        Self {
            animation,
            kind,
            speed: 1,
            delay: 0,
            frame,
        }
    }

    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    pub fn kind(&self) -> AnimationType {
        self.kind
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn face(&self) -> u32 {
        self.animation.face(self.frame)
    }

    fn set_speed(&mut self, speed: u32) {
        self.speed = speed;
        self.delay = 0;
    }

    /// Advances by one game tick. Returns the new face when the frame changed.
    fn tick(&mut self, tick_no: u32) -> Option<u32> {
        if self.speed == 0 || self.animation.face_count() < 2 {
            return None;
        }

        let next = match self.kind {
            AnimationType::Synchronize => synchronized_frame(&self.animation, self.speed, tick_no),
            AnimationType::Normal | AnimationType::Randomize => {
                self.delay += 1;
                if self.delay < self.speed {
                    return None;
                }
                self.delay = 0;
                (self.frame + 1) % self.animation.face_count()
            }
        };

        if next == self.frame {
            return None;
        }
        self.frame = next;
        Some(self.face())
    }
}

fn synchronized_frame(animation: &Animation, speed: u32, tick_no: u32) -> usize {
    (tick_no / speed.max(1)) as usize % animation.face_count()
}

/// Active animation instances keyed by their logical location.
#[derive(Debug)]
pub struct VisibleAnimations {
    width: usize,
    height: usize,
    animations: HashMap<Location, AnimationState>,
    last_tick: u32,
    rng: StdRng,
}

impl Default for VisibleAnimations {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            animations: HashMap::new(),
            last_tick: 0,
            rng: StdRng::from_entropy(),
        }
    }
}

impl VisibleAnimations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the animation at `location` and returns the face
    /// of its first displayed frame.
    pub fn add(&mut self, location: Location, animation: Arc<Animation>, kind: AnimationType) -> u32 {
        let state = AnimationState::new(animation, kind, self.last_tick, &mut self.rng);
        let face = state.face();
        self.animations.insert(location, state);
        face
    }

    pub fn remove(&mut self, location: &Location) -> bool {
        self.animations.remove(location).is_some()
    }

    /// Removes the instances on one floor band of a logical square.
    pub fn remove_floor(&mut self, x: i32, y: i32, band: FloorBand) {
        let layers = band.layers();
        self.animations
            .retain(|loc, _| loc.x != x || loc.y != y || !layers.contains(&loc.layer));
    }

    /// Changes the playback speed of the instance at `location`, if any.
    pub fn update_speed(&mut self, location: &Location, speed: u32) -> bool {
        match self.animations.get_mut(location) {
            Some(state) => {
                state.set_speed(speed);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, location: &Location) -> Option<&AnimationState> {
        self.animations.get(location)
    }

    /// Advances every instance by one tick and returns the squares whose face
    /// changed, ordered by location.
    pub fn tick(&mut self, tick_no: u32) -> Vec<(Location, u32)> {
        self.last_tick = tick_no;
        let mut changed: Vec<(Location, u32)> = self
            .animations
            .iter_mut()
            .filter_map(|(loc, state)| state.tick(tick_no).map(|face| (*loc, face)))
            .collect();
        changed.sort_by_key(|(loc, _)| *loc);
        changed
    }

    /// Follows a map scroll: instances move against the view and those that
    /// leave the map are dropped.
    pub fn scroll(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let (width, height) = (self.width as i32, self.height as i32);
        self.animations = std::mem::take(&mut self.animations)
            .into_iter()
            .map(|(loc, state)| (loc.offset(dx.saturating_neg(), dy.saturating_neg()), state))
            .filter(|(loc, _)| loc.x >= 0 && loc.y >= 0 && loc.x < width && loc.y < height)
            .collect();
    }

    /// Sets the visible map size and drops instances outside it.
    pub fn set_map_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let (width, height) = (width as i32, height as i32);
        self.animations
            .retain(|loc, _| loc.x >= 0 && loc.y >= 0 && loc.x < width && loc.y < height);
    }

    pub fn clear(&mut self) {
        self.animations.clear();
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}
