//! In-memory session store
//!
//! One slot per chat, each guarded by its own async mutex so events for one
//! session are applied strictly one at a time while other sessions proceed.
//! Nothing survives a restart.

use crate::state_machine::{SessionId, SessionRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<Option<SessionRecord>>>;
type SlotMap = Arc<Mutex<HashMap<SessionId, Slot>>>;

/// Session records keyed by chat.
///
/// A record leaves only through its session's own events (render, cancel or
/// restart). There is no idle expiry: a form the user walks away from stays
/// until the process exits.
#[derive(Default, Clone)]
pub struct SessionStore {
    slots: SlotMap,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section for one session.
    ///
    /// Waits while another event for the same session is being applied.
    pub async fn lock(&self, id: &SessionId) -> SessionSlot {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(id.clone()).or_default())
        };
        let guard = slot.lock_owned().await;
        SessionSlot {
            id: id.clone(),
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
        }
    }

    /// Number of sessions holding a slot (in progress or currently locked)
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to one session's record.
///
/// Dropping the slot releases the session; an empty slot is then removed
/// from the store unless another event is already waiting on it.
pub struct SessionSlot {
    id: SessionId,
    guard: Option<OwnedMutexGuard<Option<SessionRecord>>>,
    slots: SlotMap,
}

impl SessionSlot {
    pub fn get(&self) -> Option<&SessionRecord> {
        self.guard.as_ref().and_then(|g| g.as_ref())
    }

    pub fn set(&mut self, record: SessionRecord) {
        if let Some(guard) = self.guard.as_mut() {
            **guard = Some(record);
        }
    }

    /// Delete the record, returning it
    pub fn take(&mut self) -> Option<SessionRecord> {
        self.guard.as_mut().and_then(|g| g.take())
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        let emptied = self.guard.as_ref().is_some_and(|g| g.is_none());
        // Release the session before touching the map
        self.guard = None;
        if !emptied {
            return;
        }

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = slots.get(&self.id).is_some_and(|slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|record| record.is_none())
        });
        if idle {
            slots.remove(&self.id);
        }
    }
}
