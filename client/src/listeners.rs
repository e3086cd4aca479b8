//! Observers of the client map state.
//!
//! Listeners run synchronously on the thread that triggered the event, while
//! the map updater still holds its session lock. They must not call back into
//! the updater and should copy out what they need instead of doing expensive
//! work in place.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::map::{GameMap, MapPos};

/// Notified once per map batch with every square changed in it.
pub trait MapListener: Send + Sync {
    fn map_changed(&self, map: &GameMap, squares: &BTreeSet<MapPos>);
}

/// Notified when the server switches to a different map.
pub trait NewMapListener: Send + Sync {
    fn new_map(&self);
}

/// Notified as soon as the view has scrolled.
pub trait MapScrollListener: Send + Sync {
    fn map_scrolled(&self, dx: i32, dy: i32);
}

/// Notified when the visible map dimensions change.
pub trait MapSizeListener: Send + Sync {
    fn map_size_changed(&self, width: usize, height: usize);
}

/// A thread-safe list of listeners.
///
/// Notification works on a snapshot, so listeners may be added or removed
/// from other threads while a notification is running.
pub struct ListenerList<T: ?Sized> {
    listeners: Mutex<Vec<Arc<T>>>,
}

impl<T: ?Sized> Default for ListenerList<T> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> ListenerList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<T>) {
        self.lock().push(listener);
    }

    /// Removes a listener previously added with the same `Arc`.
    pub fn remove(&self, listener: &Arc<T>) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.lock().clone()
    }

    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for listener in self.snapshot() {
            f(listener.as_ref());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<T>>> {
        self.listeners.lock().unwrap_or_else(|poisoned| {
            log::error!("listener list mutex poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}
