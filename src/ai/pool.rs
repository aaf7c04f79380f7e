use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::future::join_all;

/// Map `f` over `items` with at most `limit` calls in flight, preserving
/// input order in the output regardless of completion order.
///
/// `limit` cooperative workers drain a shared index cursor; each worker
/// claims the next position, processes it to completion, and writes the
/// result into that position's slot. The cursor is advanced atomically,
/// so no two workers claim the same index.
pub async fn bounded_map<T, U, F, Fut>(items: Vec<T>, limit: usize, f: F) -> Vec<U>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = U>,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let limit = limit.clamp(1, total);

    let slots: Vec<Mutex<Option<T>>> = items.into_iter().map(|i| Mutex::new(Some(i))).collect();
    let results: Vec<Mutex<Option<U>>> = (0..total).map(|_| Mutex::new(None)).collect();
    let cursor = AtomicUsize::new(0);

    let workers = (0..limit).map(|_| {
        let slots = &slots;
        let results = &results;
        let cursor = &cursor;
        let f = &f;
        async move {
            loop {
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= total {
                    break;
                }
                let item = slots[index]
                    .lock()
                    .expect("slot lock")
                    .take()
                    .expect("index claimed exactly once");
                let output = f(item).await;
                *results[index].lock().expect("result lock") = Some(output);
            }
        }
    });
    join_all(workers).await;

    results
        .into_iter()
        .map(|slot| {
            slot.into_inner()
                .expect("result lock")
                .expect("every index processed")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn empty_input_returns_empty() {
        let out: Vec<u32> = bounded_map(Vec::<u32>::new(), 5, |x| async move { x }).await;
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn output_order_matches_input_despite_reverse_completion() {
        // Earlier items sleep longer, so completion order is reversed.
        let items: Vec<u64> = (0..8).collect();
        let out = bounded_map(items, 8, |n| async move {
            tokio::time::sleep(Duration::from_millis((8 - n) * 10)).await;
            n * 2
        })
        .await;

        assert_eq!(out, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_never_exceeds_limit() {
        let in_flight = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        let items: Vec<u32> = (0..10).collect();
        let out = bounded_map(items, 3, |n| {
            let in_flight = &in_flight;
            let max_seen = &max_seen;
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                n
            }
        })
        .await;

        assert_eq!(out, (0..10).collect::<Vec<u32>>());
        assert_eq!(max_seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn limit_larger_than_input_is_fine() {
        let out = bounded_map(vec![1, 2], 16, |n| async move { n + 1 }).await;
        assert_eq!(out, vec![2, 3]);
    }
}
