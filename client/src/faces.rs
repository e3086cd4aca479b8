//! The seam between the map state and the face cache.
//!
//! Face images are loaded elsewhere, usually on a cache-loading thread. The
//! map state only needs to resolve face numbers and to hear about faces that
//! became available after a square already asked for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use wg_core::types::Face;

/// Resolves face numbers. Face number 0 always means "no face".
pub trait FacesProvider: Send + Sync {
    /// Returns `None` for 0 and for faces that are not known yet.
    fn face(&self, face_num: u32) -> Option<Face>;
}

/// Notified when a face finished loading.
pub trait FacesListener: Send + Sync {
    fn face_updated(&self, face: &Face);
}

/// In-memory face registry. Inserting a face notifies the registered
/// listeners on the inserting thread.
#[derive(Default)]
pub struct FaceCache {
    faces: RwLock<HashMap<u32, Face>>,
    listeners: Mutex<Vec<Weak<dyn FacesListener>>>,
}

impl FaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener without keeping it alive.
    pub fn add_listener<L: FacesListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<dyn FacesListener> = Arc::downgrade(listener) as Weak<dyn FacesListener>;
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(weak);
    }

    /// Stores a loaded face and tells the listeners about it.
    pub fn insert(&self, face: Face) {
        if face.face_num == 0 {
            log::warn!("ignoring attempt to register face 0");
            return;
        }

        self.faces
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(face.face_num, face);

        let live: Vec<Arc<dyn FacesListener>> = {
            let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };

        log::trace!("face {} loaded, notifying {} listeners", face.face_num, live.len());
        for listener in live {
            listener.face_updated(&face);
        }
    }

    pub fn contains(&self, face_num: u32) -> bool {
        self.faces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&face_num)
    }

    pub fn len(&self) -> usize {
        self.faces.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FacesProvider for FaceCache {
    fn face(&self, face_num: u32) -> Option<Face> {
        if face_num == 0 {
            return None;
        }
        self.faces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&face_num)
            .copied()
    }
}
