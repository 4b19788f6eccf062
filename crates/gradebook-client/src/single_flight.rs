//! Single-flight coalescing of an async operation
//!
//! A `SingleFlight` holds at most one pending operation. The first caller
//! starts it; callers arriving while it runs attach to the same shared
//! future and receive a clone of its output.
//!
//! The operation runs on its own tokio task, so it settles and empties the
//! slot even when every caller has been dropped. The next call after
//! settlement starts a fresh operation. A task that panics or is cancelled
//! yields `T::default()`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::warn;

type Pending<T> = Shared<BoxFuture<'static, T>>;

struct Slot<T: Clone> {
    generation: u64,
    pending: Option<Pending<T>>,
}

/// Coalesces concurrent calls into one in-flight operation.
pub struct SingleFlight<T: Clone> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                pending: None,
            })),
        }
    }
}

impl<T: Clone> Clone for SingleFlight<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

// The slot is never held across an await, so a poisoned lock only means a
// panic elsewhere; the data is still consistent.
fn lock<T: Clone>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn settle<T: Clone>(slot: &Mutex<Slot<T>>, generation: u64) {
    let mut slot = lock(slot);
    if slot.generation == generation {
        slot.pending = None;
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation`, or join the one already in flight.
    ///
    /// `operation` is only invoked when no operation is pending. Returns the
    /// output and whether this call started the operation. Must be called
    /// from within a tokio runtime.
    pub async fn run<F, Fut>(&self, operation: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (pending, leader) = {
            let mut slot = lock(&self.slot);
            match slot.pending {
                Some(ref pending) => (pending.clone(), false),
                None => {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let owner = Arc::clone(&self.slot);
                    let work = operation();
                    let task = tokio::spawn(async move {
                        let output = work.await;
                        settle(&owner, generation);
                        output
                    });
                    let owner = Arc::clone(&self.slot);
                    let shared = async move {
                        match task.await {
                            Ok(output) => output,
                            Err(e) => {
                                warn!(error = %e, "single-flight operation did not complete");
                                settle(&owner, generation);
                                T::default()
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    slot.pending = Some(shared.clone());
                    (shared, true)
                }
            }
        };
        (pending.await, leader)
    }

    /// Whether an operation is currently pending.
    pub fn in_flight(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }
}
