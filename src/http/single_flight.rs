use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

type Slot<T> = Arc<Mutex<Option<Shared<BoxFuture<'static, T>>>>>;

/// Runs at most one instance of an async operation at a time.
///
/// The first caller starts the operation and publishes a shared handle;
/// callers arriving while it runs await that handle and receive a clone of
/// the same output. The handle is dropped as soon as the operation finishes,
/// so the next caller starts a fresh run.
pub struct SingleFlight<T> {
    slot: Slot<T>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the running operation, or starts one with `start`.
    ///
    /// The check and the publish happen under one lock that is released
    /// before anything is awaited.
    pub async fn run<F, Fut>(&self, start: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut slot = lock(&self.slot);
            match slot.as_ref() {
                Some(running) => {
                    debug!("Joining in-flight operation");
                    running.clone()
                }
                None => {
                    let operation = start();
                    let slot_ref = Arc::clone(&self.slot);
                    let shared = async move {
                        let output = operation.await;
                        *lock(&slot_ref) = None;
                        output
                    }
                    .boxed()
                    .shared();
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    pub fn in_flight(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
