//! Bounded batch scheduler for member staging.
//!
//! Items are split into consecutive batches of at most `concurrency` items.
//! A batch's futures are polled together on the calling task; the next batch
//! starts only after every future in the current one has settled. Nothing is
//! spawned, so "concurrent" here means interleaved, not parallel.

use futures::future::join_all;
use std::future::Future;

/// Default maximum number of in-flight tasks per batch.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Run `task` over `items`, at most `concurrency` at a time.
///
/// Results come back in input order. If any task in a batch fails, the
/// remaining tasks of that batch are still awaited, no further batch is
/// started, and the first failure in input order is returned. A
/// concurrency of 0 is treated as 1.
pub async fn run_batched<'a, T, R, E, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    mut task: F,
) -> Result<Vec<R>, E>
where
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let size = concurrency.max(1);
    let batch_count = items.len().div_ceil(size);
    let mut results = Vec::with_capacity(items.len());

    for (index, batch) in items.chunks(size).enumerate() {
        tracing::debug!(
            batch = index + 1,
            of = batch_count,
            size = batch.len(),
            "starting batch"
        );
        let settled = join_all(batch.iter().map(&mut task)).await;
        for outcome in settled {
            results.push(outcome?);
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records how many tasks had settled when each task started.
    struct Tracker {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        settled: AtomicUsize,
        settled_at_start: Mutex<Vec<(usize, usize)>>,
    }

    impl Tracker {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                settled: AtomicUsize::new(0),
                settled_at_start: Mutex::new(Vec::new()),
            }
        }

        async fn work(&self, item: usize, fail_on: Option<usize>) -> Result<usize, String> {
            self.settled_at_start
                .lock()
                .unwrap()
                .push((item, self.settled.load(Ordering::SeqCst)));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::task::yield_now().await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.settled.fetch_add(1, Ordering::SeqCst);
            if fail_on == Some(item) {
                Err(format!("item {} failed", item))
            } else {
                Ok(item * 2)
            }
        }
    }

    #[tokio::test]
    async fn test_twelve_items_run_as_ten_then_two() {
        let tracker = Tracker::new();
        let items: Vec<usize> = (0..12).collect();

        let results = run_batched(&items, 10, |item| tracker.work(*item, None))
            .await
            .unwrap();

        assert_eq!(results, items.iter().map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(tracker.max_in_flight.load(Ordering::SeqCst), 10);

        let starts = tracker.settled_at_start.lock().unwrap();
        for (item, settled) in starts.iter() {
            if *item < 10 {
                assert!(*settled < 10);
            } else {
                assert_eq!(*settled, 10, "item {} started before batch 1 settled", item);
            }
        }
    }

    /// Batch sizes observed by `tracker`, in order.
    ///
    /// Every task of a batch starts before any of them settles, so tasks
    /// sharing a settled-at-start count belong to the same batch.
    fn observed_batches(tracker: &Tracker) -> BTreeMap<usize, usize> {
        let mut batches = BTreeMap::new();
        for (_, settled) in tracker.settled_at_start.lock().unwrap().iter() {
            *batches.entry(*settled).or_insert(0) += 1;
        }
        batches
    }

    #[tokio::test]
    async fn test_batch_count_is_ceiling_of_items_over_concurrency() {
        let cases = [(0, 10), (1, 10), (12, 10), (20, 10), (25, 7), (5, 1), (3, 0)];
        for (total, concurrency) in cases {
            let tracker = Tracker::new();
            let items: Vec<usize> = (0..total).collect();

            run_batched(&items, concurrency, |item| tracker.work(*item, None))
                .await
                .unwrap();

            let size = concurrency.max(1);
            let batches = observed_batches(&tracker);
            assert_eq!(
                batches.len(),
                total.div_ceil(size),
                "{} items at concurrency {}",
                total,
                concurrency
            );

            let sizes: Vec<usize> = batches.values().copied().collect();
            assert_eq!(sizes.iter().sum::<usize>(), total);
            if let Some((last, rest)) = sizes.split_last() {
                assert!(*last <= size);
                assert!(rest.iter().all(|s| *s == size));
            }
            let starts: Vec<usize> = batches.keys().copied().collect();
            let expected: Vec<usize> = (0..sizes.len()).map(|k| k * size).collect();
            assert_eq!(starts, expected);
        }
    }

    #[tokio::test]
    async fn test_failure_stops_later_batches_after_siblings_settle() {
        let tracker = Tracker::new();
        let items: Vec<usize> = (0..25).collect();

        let result = run_batched(&items, 10, |item| tracker.work(*item, Some(13))).await;

        assert_eq!(result.unwrap_err(), "item 13 failed");
        let started: Vec<usize> = tracker
            .settled_at_start
            .lock()
            .unwrap()
            .iter()
            .map(|(item, _)| *item)
            .collect();
        assert_eq!(started.len(), 20);
        assert!(started.iter().all(|item| *item < 20));
        assert_eq!(tracker.settled.load(Ordering::SeqCst), 20);
        assert_eq!(tracker.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_failure_in_input_order_wins() {
        let items = vec![1, 2, 3];
        let result: Result<Vec<i32>, String> = run_batched(&items, 3, |item| async move {
            if *item >= 2 {
                Err(format!("bad {}", item))
            } else {
                Ok(*item)
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), "bad 2");
    }

    #[tokio::test]
    async fn test_zero_concurrency_runs_one_at_a_time() {
        let tracker = Tracker::new();
        let items: Vec<usize> = (0..4).collect();
        run_batched(&items, 0, |item| tracker.work(*item, None))
            .await
            .unwrap();
        assert_eq!(tracker.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_input_runs_nothing() {
        let items: Vec<usize> = Vec::new();
        let results: Vec<usize> =
            run_batched(&items, 10, |item| async move { Ok::<_, String>(*item) })
                .await
                .unwrap();
        assert!(results.is_empty());
    }
}
