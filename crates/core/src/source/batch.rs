//! Bounded and failure-tolerant fan-out helpers.

use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Await every labelled operation concurrently and keep only the successes.
///
/// Failures are logged with their label and dropped.
pub async fn settle_all<T, E, Fut>(operations: impl IntoIterator<Item = (String, Fut)>) -> Vec<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let (labels, futures): (Vec<String>, Vec<Fut>) = operations.into_iter().unzip();
    let results = join_all(futures).await;

    labels
        .into_iter()
        .zip(results)
        .filter_map(|(label, result)| match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(operation = %label, error = %e, "Operation failed, dropping result");
                None
            }
        })
        .collect()
}

/// Run `f` over `items` in sequential batches of at most `batch_size`
/// concurrent calls, sleeping `delay` between batches.
///
/// Output order matches input order.
pub async fn process_in_batches<T, R, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    delay: Duration,
    mut f: F,
) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();

    loop {
        let batch: Vec<Fut> = items.by_ref().take(batch_size).map(&mut f).collect();
        if batch.is_empty() {
            break;
        }
        results.extend(join_all(batch).await);

        if items.peek().is_some() {
            tokio::time::sleep(delay).await;
        }
    }

    results
}
