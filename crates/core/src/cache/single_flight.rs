//! In-flight request deduplication.

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::trace;

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// Collapses concurrent operations with the same key into a single execution.
///
/// Every caller that arrives while an operation is in flight, or within the
/// grace window after it completes, receives a clone of the same result.
/// After the grace window the key is forgotten and the next call runs again.
pub struct SingleFlight<V, E> {
    inflight: Arc<Mutex<HashMap<String, SharedResult<V, E>>>>,
    grace: Duration,
}

impl<V, E> Clone for SingleFlight<V, E> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
            grace: self.grace,
        }
    }
}

impl<V, E> SingleFlight<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(grace: Duration) -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            grace,
        }
    }

    /// Run `operation` for `key` unless one is already in flight.
    ///
    /// `operation` is only invoked when no shared result exists for `key`.
    pub async fn run<F, Fut>(&self, key: &str, operation: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                Some(existing) => {
                    trace!(key = %key, "Joining in-flight operation");
                    existing.clone()
                }
                None => {
                    let shared = self.spawn_tracked(key.to_string(), operation());
                    inflight.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Number of keys currently tracked (in flight or within the grace window).
    pub async fn tracked(&self) -> usize {
        self.inflight.lock().await.len()
    }

    fn spawn_tracked<Fut>(&self, key: String, operation: Fut) -> SharedResult<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let inflight = Arc::clone(&self.inflight);
        let grace = self.grace;

        async move {
            let result = operation.await;
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                inflight.lock().await.remove(&key);
            });
            result
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_concurrent_calls_share_one_execution() {
        let flight: SingleFlight<u32, String> = SingleFlight::new(Duration::from_secs(5));
        let counter = Arc::new(AtomicUsize::new(0));

        let calls = (0..10).map(|_| {
            let counter = Arc::clone(&counter);
            let flight = flight.clone();
            async move {
                flight
                    .run("key", || async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(7)
                    })
                    .await
            }
        });

        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r == &Ok(7)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_run_independently() {
        let flight: SingleFlight<&'static str, String> = SingleFlight::new(Duration::from_secs(5));

        let a = flight.run("a", || async { Ok("a") });
        let b = flight.run("b", || async { Ok("b") });
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a, Ok("a"));
        assert_eq!(b, Ok("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_released_after_grace_window() {
        let flight: SingleFlight<u32, String> = SingleFlight::new(Duration::from_secs(5));
        let counter = Arc::new(AtomicUsize::new(0));

        let run = |flight: SingleFlight<u32, String>, counter: Arc<AtomicUsize>| async move {
            flight
                .run("key", || async move { Ok(counter.fetch_add(1, Ordering::SeqCst) as u32) })
                .await
        };

        assert_eq!(run(flight.clone(), Arc::clone(&counter)).await, Ok(0));
        // Still within the grace window
        assert_eq!(run(flight.clone(), Arc::clone(&counter)).await, Ok(0));
        assert_eq!(flight.tracked().await, 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(flight.tracked().await, 0);

        assert_eq!(run(flight.clone(), Arc::clone(&counter)).await, Ok(1));
    }

    #[tokio::test]
    async fn test_errors_are_shared() {
        let flight: SingleFlight<u32, String> = SingleFlight::new(Duration::from_secs(5));

        let first = flight.run("key", || async { Err("boom".to_string()) }).await;
        let second = flight.run("key", || async { Ok(1) }).await;

        assert_eq!(first, Err("boom".to_string()));
        assert_eq!(second, Err("boom".to_string()));
    }
}
