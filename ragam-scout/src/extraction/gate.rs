//! Counting admission gate for page-extraction tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::ScoutError;

#[derive(Debug)]
struct GateState {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    active: AtomicUsize,
    waiting: AtomicUsize,
    peak: AtomicUsize,
}

/// Caps how many tasks run at once.
///
/// Waiters are admitted in FIFO order. A slot is held by a [`GatePermit`]
/// and released exactly once when the permit drops, on every exit path.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    state: Arc<GateState>,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` slots; values below 1 become 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(GateState {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                active: AtomicUsize::new(0),
                waiting: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Waits for a slot.
    pub async fn acquire(&self) -> Result<GatePermit, ScoutError> {
        self.state.waiting.fetch_add(1, Ordering::SeqCst);
        let acquired = Arc::clone(&self.state.semaphore).acquire_owned().await;
        self.state.waiting.fetch_sub(1, Ordering::SeqCst);

        let permit = acquired.map_err(|_| ScoutError::Internal("admission gate closed".to_string()))?;
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(active, Ordering::SeqCst);

        Ok(GatePermit {
            _permit: permit,
            state: Arc::clone(&self.state),
        })
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.capacity
    }

    /// Tasks currently holding a slot.
    #[must_use]
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Tasks queued for a slot.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.state.waiting.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held slots.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }

    /// Free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.state.semaphore.available_permits()
    }
}

/// A held slot; dropping it releases the slot.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    state: Arc<GateState>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
    }
}
