//! Higher-order memoization of async functions.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use super::TtlCache;

type CallFn<A, V, E> = dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync;
type KeyFn<A> = dyn Fn(&A) -> String + Send + Sync;

/// An async function whose successful results are cached by a derived key.
///
/// Concurrent calls with the same key are not deduplicated; wrap the inner
/// function with a [`super::SingleFlight`] for that. Errors are never cached.
pub struct Memoized<A, V, E> {
    call: Arc<CallFn<A, V, E>>,
    key_fn: Arc<KeyFn<A>>,
    cache: Arc<TtlCache<V>>,
}

impl<A, V, E> Clone for Memoized<A, V, E> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
            key_fn: Arc::clone(&self.key_fn),
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Wrap `func` so its results are cached under `key_fn(arg)` for `ttl`,
/// keeping at most `max_entries` results.
pub fn cached<A, V, E, F, Fut, K>(
    func: F,
    key_fn: K,
    ttl: Duration,
    max_entries: usize,
) -> Memoized<A, V, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    K: Fn(&A) -> String + Send + Sync + 'static,
    V: Clone,
{
    Memoized {
        call: Arc::new(move |arg| func(arg).boxed()),
        key_fn: Arc::new(key_fn),
        cache: Arc::new(TtlCache::new(ttl, max_entries)),
    }
}

impl<A, V: Clone, E> Memoized<A, V, E> {
    pub async fn call(&self, arg: A) -> Result<V, E> {
        let key = (self.key_fn)(&arg);

        if let Some(value) = self.cache.get(&key).await {
            trace!(key = %key, "Cache hit");
            return Ok(value);
        }

        let value = (self.call)(arg).await?;
        self.cache.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Drop a cached result so the next call recomputes it.
    pub async fn invalidate(&self, key: &str) {
        self.cache.remove(key).await;
    }
}
