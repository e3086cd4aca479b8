//! Animation definitions received from the server.

use std::collections::HashMap;
use std::sync::Arc;

/// An animation: an ordered list of face numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    animation_id: u16,
    /// Sent by the server; not interpreted by the client.
    flags: u16,
    faces: Vec<u32>,
}

impl Animation {
    pub fn new(animation_id: u16, flags: u16, faces: Vec<u32>) -> Self {
        Self {
            animation_id,
            flags,
            faces,
        }
    }

    pub fn animation_id(&self) -> u16 {
        self.animation_id
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Face shown for `frame`, wrapping past the last frame.
    pub fn face(&self, frame: usize) -> u32 {
        self.faces[frame % self.faces.len()]
    }
}

/// All animations defined in the current session, keyed by animation id.
#[derive(Debug, Default)]
pub struct Animations {
    animations: HashMap<u16, Arc<Animation>>,
}

impl Animations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines an animation. Redefining an id replaces the old definition;
    /// instances already playing keep the definition they started with.
    pub fn add_animation(&mut self, animation_id: u16, flags: u16, faces: &[u32]) {
        if faces.is_empty() {
            log::warn!("animation id {animation_id} has no faces, ignoring");
            return;
        }
        if faces.len() == 1 {
            log::warn!("animation id {animation_id} has only one face");
        }

        let animation = Arc::new(Animation::new(animation_id, flags, faces.to_vec()));
        if self.animations.insert(animation_id, animation).is_some() {
            log::warn!("duplicate animation id {animation_id}");
        }
    }

    pub fn get(&self, animation_id: u16) -> Option<Arc<Animation>> {
        self.animations.get(&animation_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn clear(&mut self) {
        self.animations.clear();
    }
}
