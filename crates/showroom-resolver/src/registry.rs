use parking_lot::Mutex;
use showroom_core::{FetchedMedia, LocalHandle};
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    released: bool,
    live: HashMap<LocalHandle, FetchedMedia>,
}

/// Owns the bytes behind every local handle of one view.
///
/// Once [`release_all`](HandleRegistry::release_all) has run the registry is
/// closed: later registrations are refused so nothing outlives the view.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    state: Mutex<RegistryState>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `media` and hands out a fresh handle for it.
    ///
    /// Returns `None` if the registry has already been released.
    pub fn register(&self, media: FetchedMedia) -> Option<LocalHandle> {
        let mut state = self.state.lock();
        if state.released {
            trace!("handle registry released, refusing registration");
            return None;
        }

        state.next_id += 1;
        let handle = LocalHandle::new(state.next_id);
        debug!(handle = %handle, bytes = media.len(), "registered local handle");
        state.live.insert(handle.clone(), media);
        Some(handle)
    }

    /// Returns the media behind a live handle.
    pub fn lookup(&self, handle: &LocalHandle) -> Option<FetchedMedia> {
        self.state.lock().live.get(handle).cloned()
    }

    /// Releases one handle. Returns `true` if it was live.
    pub fn release(&self, handle: &LocalHandle) -> bool {
        let released = self.state.lock().live.remove(handle).is_some();
        if released {
            debug!(handle = %handle, "released local handle");
        }
        released
    }

    /// Releases every handle and closes the registry.
    ///
    /// Returns how many handles were still live.
    pub fn release_all(&self) -> usize {
        let mut state = self.state.lock();
        state.released = true;
        let count = state.live.len();
        state.live.clear();
        if count > 0 {
            debug!(count, "released all local handles");
        }
        count
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}
