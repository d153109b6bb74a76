//! In-memory active-timer registry.
//!
//! # Responsibility
//! - Track which study sessions are currently running and since when.
//! - Serialize all registry mutations behind one lock.
//!
//! # Invariants
//! - Entry existence is the sole authority for "this session is running".
//! - Entries are never persisted; a process restart drops them and leaves
//!   unfinished session rows as orphans for out-of-band reconciliation.
//! - A claimed entry cannot be claimed again until released, so a session
//!   is finalized at most once.
//!
//! # See also
//! - `service::progression_service` for the claim/remove lifecycle.

use crate::model::character::CharacterId;
use crate::model::session::SessionId;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A timer with this session id is already registered.
    DuplicateSession(SessionId),
    /// No claimable timer exists for this session id: never started,
    /// already stopped, mid-finalization, or lost to a process restart.
    SessionNotFound(SessionId),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSession(id) => write!(f, "timer already registered: {id}"),
            Self::SessionNotFound(id) => write!(f, "active timer not found: {id}"),
        }
    }
}

impl Error for RegistryError {}

/// Snapshot of one running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTimer {
    pub character_uuid: CharacterId,
    /// Start instant in Unix epoch milliseconds.
    pub started_at: i64,
}

struct TimerSlot {
    timer: ActiveTimer,
    /// Set while a stop is computing and persisting rewards.
    finalizing: bool,
}

/// Lock-guarded table of running timers, keyed by session id.
///
/// Owned explicitly and injected into the orchestrator; the registry is
/// keyed by session and deliberately does not enforce one timer per
/// character.
#[derive(Default)]
pub struct SessionRegistry {
    slots: Mutex<HashMap<SessionId, TimerSlot>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a running timer for a freshly created session.
    pub fn register(
        &self,
        session: SessionId,
        character: CharacterId,
        now_ms: i64,
    ) -> Result<(), RegistryError> {
        let mut slots = self.lock();
        if slots.contains_key(&session) {
            return Err(RegistryError::DuplicateSession(session));
        }
        slots.insert(
            session,
            TimerSlot {
                timer: ActiveTimer {
                    character_uuid: character,
                    started_at: now_ms,
                },
                finalizing: false,
            },
        );
        Ok(())
    }

    /// Returns a snapshot of one running timer, if any.
    pub fn lookup(&self, session: SessionId) -> Option<ActiveTimer> {
        self.lock().get(&session).map(|slot| slot.timer)
    }

    /// Claims a timer for finalization.
    ///
    /// The entry stays in the table, marked, so a failed persistence can
    /// be retried later; a concurrent second stop observes
    /// `SessionNotFound` instead of double-applying rewards.
    pub fn claim(&self, session: SessionId) -> Result<ActiveTimer, RegistryError> {
        let mut slots = self.lock();
        match slots.get_mut(&session) {
            Some(slot) if !slot.finalizing => {
                slot.finalizing = true;
                Ok(slot.timer)
            }
            _ => Err(RegistryError::SessionNotFound(session)),
        }
    }

    /// Releases a claim after a failed finalization so the timer becomes
    /// stoppable again.
    pub fn release(&self, session: SessionId) {
        if let Some(slot) = self.lock().get_mut(&session) {
            slot.finalizing = false;
        }
    }

    /// Removes a timer once its rewards are durably applied.
    pub fn remove(&self, session: SessionId) {
        self.lock().remove(&session);
    }

    /// Number of registered timers, claimed ones included.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, TimerSlot>> {
        // A panic while holding the lock leaves plain data behind; keep
        // serving the map instead of propagating the poison.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
