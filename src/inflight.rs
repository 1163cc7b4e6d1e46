use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use uuid::Uuid;

/// Tracks admin actions that are currently running so a second submission of
/// the same action is refused instead of executed twice.
#[derive(Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<(Uuid, &'static str)>>>,
}

/// Releases its slot on drop.
#[must_use]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<(Uuid, &'static str)>>>,
    key: (Uuid, &'static str),
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the same admin already has `action` running.
    pub fn begin(&self, admin: Uuid, action: &'static str) -> Option<InFlightGuard> {
        let key = (admin, action);
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key);
        inserted.then(|| InFlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}
