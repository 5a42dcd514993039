//! Generation-guarded event channel from the search core to its renderers.
//!
//! Starting a session and publishing an event take the same lock, so once
//! `begin` returns no event tagged with an older generation can be sent.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use flightfinder_core::{EventKind, Generation, SessionEvent};

pub struct EventBus {
    current: Mutex<Generation>,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bus = EventBus {
            current: Mutex::new(Generation::default()),
            tx,
        };
        (Arc::new(bus), rx)
    }

    /// Supersede the current session and return the new generation.
    pub fn begin(&self) -> Generation {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = current.next();
        *current
    }

    pub fn current(&self) -> Generation {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Send `kind` if `generation` is still current. Returns false if stale.
    pub fn publish(&self, generation: Generation, kind: EventKind) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            trace!(%generation, current = %*current, "dropping stale event");
            return false;
        }
        if self.tx.send(SessionEvent { generation, kind }).is_err() {
            trace!(%generation, "no renderer attached");
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
