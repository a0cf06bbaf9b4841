use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{event::UserId, save::PendingSave};
use crate::flows::states::SessionState;

type Slot = Arc<AsyncMutex<Option<PendingSave>>>;

/// Per-user pending-save slots.
///
/// Each user gets a slot with its own async lock. A caller holds the slot for the
/// whole read-modify-write of one event, including any awaited provider or store
/// call, so two events from the same user never interleave while different users
/// proceed independently. Slots are never removed once created.
#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<UserId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, user_id: &UserId) -> SessionGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.entry(user_id.clone()).or_default().clone()
        };

        SessionGuard { user_id: user_id.clone(), slot: slot.lock_owned().await }
    }

    pub async fn pending(&self, user_id: &UserId) -> Option<PendingSave> {
        self.lock(user_id).await.pending().cloned()
    }

    /// Users holding a pending save. A slot busy with an in-flight event counts as pending.
    pub fn pending_count(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| slot.try_lock().map_or(true, |pending| pending.is_some()))
            .count()
    }
}

pub struct SessionGuard {
    user_id: UserId,
    slot: OwnedMutexGuard<Option<PendingSave>>,
}

impl SessionGuard {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn state(&self) -> SessionState {
        match *self.slot {
            Some(_) => SessionState::AwaitingSaveDecision,
            None => SessionState::Idle,
        }
    }

    pub fn pending(&self) -> Option<&PendingSave> {
        self.slot.as_ref()
    }

    /// Stores `pending`, returning whatever it superseded.
    pub fn replace(&mut self, pending: PendingSave) -> Option<PendingSave> {
        self.slot.replace(pending)
    }

    pub fn clear(&mut self) -> Option<PendingSave> {
        self.slot.take()
    }
}
