//! Keyed single-flight execution
//!
//! When several tasks ask for the same operation at the same time, only the
//! first one starts it. Everyone else awaits the same shared future and gets a
//! clone of its result. The operation runs on its own task, so it settles and
//! clears its registration even if every waiter is dropped; the next request
//! after that starts a fresh execution.
//!
//! ```rust
//! use dialer_core::single_flight::SingleFlight;
//!
//! # tokio_test_block_on(async {
//! let flights: SingleFlight<&'static str, u32> = SingleFlight::new();
//! let (a, b) = tokio::join!(
//!     flights.run("refresh", || async { 1 }),
//!     flights.run("refresh", || async { 2 }),
//! );
//! assert_eq!(a, b);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

type Flight<T> = Shared<BoxFuture<'static, T>>;

pub struct SingleFlight<K, T>
where
    T: Clone,
{
    inflight: Arc<Mutex<HashMap<K, Flight<T>>>>,
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `make()` for `key` unless an execution for `key` is already in
    /// flight, in which case its result is shared instead.
    ///
    /// `make` is only invoked by the caller that registers the flight. The
    /// returned future is spawned on the current tokio runtime.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut inflight = self.inflight.lock();
            match inflight.get(&key) {
                Some(existing) => {
                    tracing::trace!("Joining in-flight operation");
                    existing.clone()
                }
                None => {
                    let registry = Arc::clone(&self.inflight);
                    let settled_key = key.clone();
                    let operation = make();
                    let task = tokio::spawn(async move {
                        let output = AssertUnwindSafe(operation).catch_unwind().await;
                        registry.lock().remove(&settled_key);
                        output
                    });
                    let flight = async move {
                        match task.await {
                            Ok(Ok(output)) => output,
                            Ok(Err(payload)) => panic::resume_unwind(payload),
                            Err(e) => match e.try_into_panic() {
                                Ok(payload) => panic::resume_unwind(payload),
                                Err(e) => panic!("single-flight task did not finish: {}", e),
                            },
                        }
                    }
                    .boxed()
                    .shared();
                    inflight.insert(key, flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Whether an execution for `key` is registered right now
    pub fn in_flight(&self, key: &K) -> bool {
        self.inflight.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
