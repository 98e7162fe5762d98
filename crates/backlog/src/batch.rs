//! Chunked fan-out for multi-id fetches.
//!
//! The remote batch endpoint accepts at most a fixed number of ids per
//! request, so large id sets are split into chunks and fetched
//! concurrently. Actual concurrency is bounded by the rate limiter inside
//! the caller's fetch function; this module only shapes the work.

use std::collections::BTreeSet;
use std::fmt::Display;

use futures::future::join_all;

/// Server-accepted maximum number of ids per batch request.
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// How chunk-level failures affect the merged result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The whole operation fails; the earliest failing chunk (in chunk
    /// order) supplies the error.
    #[default]
    Fail,
    /// Failing chunks are logged and contribute nothing; the rest of the
    /// result is still returned.
    Omit,
}

/// Fetch `ids` in chunks and merge the results.
///
/// The id set is deduplicated and sorted ascending before chunking, so
/// identical input sets produce identical chunk requests regardless of
/// caller-supplied order or duplicates. Empty input returns an empty
/// result without invoking `fetch_chunk` at all. Chunk fetches run
/// concurrently; results are merged in chunk order even when execution
/// completes out of order. Dropping the returned future drops every
/// in-flight chunk fetch with it.
pub async fn process_batches<T, E, F, Fut>(
    ids: &[i32],
    chunk_size: usize,
    error_policy: ErrorPolicy,
    fetch_chunk: F,
) -> Result<Vec<T>, E>
where
    F: Fn(Vec<i32>) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
    E: Display,
{
    let unique: Vec<i32> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    if unique.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = chunk_size.max(1);
    let futures: Vec<_> = unique
        .chunks(chunk_size)
        .map(|chunk| fetch_chunk(chunk.to_vec()))
        .collect();

    let mut merged = Vec::new();
    for (index, outcome) in join_all(futures).await.into_iter().enumerate() {
        match outcome {
            Ok(items) => merged.extend(items),
            Err(err) => match error_policy {
                ErrorPolicy::Fail => return Err(err),
                ErrorPolicy::Omit => {
                    tracing::warn!("skipping failed chunk {index}: {err}");
                }
            },
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Record every chunk passed to the fetch function.
    fn recording_fetch(
        calls: Arc<Mutex<Vec<Vec<i32>>>>,
    ) -> impl Fn(Vec<i32>) -> futures::future::Ready<Result<Vec<i32>, String>> {
        move |chunk: Vec<i32>| {
            calls.lock().unwrap().push(chunk.clone());
            futures::future::ready(Ok(chunk))
        }
    }

    #[tokio::test]
    async fn deduplicates_and_sorts_before_chunking() {
        let calls = Arc::new(Mutex::new(Vec::new()));

        let merged = process_batches(&[124, 123, 124, 123], 200, ErrorPolicy::Fail, recording_fetch(Arc::clone(&calls)))
            .await
            .expect("batch");

        assert_eq!(merged, vec![123, 124]);
        assert_eq!(*calls.lock().unwrap(), vec![vec![123, 124]]);
    }

    #[tokio::test]
    async fn identical_sets_issue_identical_requests() {
        let first_calls = Arc::new(Mutex::new(Vec::new()));
        let second_calls = Arc::new(Mutex::new(Vec::new()));

        process_batches(&[124, 123, 124, 123], 200, ErrorPolicy::Fail, recording_fetch(Arc::clone(&first_calls)))
            .await
            .expect("batch");
        process_batches(&[123, 124], 200, ErrorPolicy::Fail, recording_fetch(Arc::clone(&second_calls)))
            .await
            .expect("batch");

        assert_eq!(*first_calls.lock().unwrap(), *second_calls.lock().unwrap());
    }

    #[tokio::test]
    async fn splits_450_ids_into_exactly_three_chunks() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ids: Vec<i32> = (1..=450).collect();

        let merged = process_batches(&ids, 200, ErrorPolicy::Fail, recording_fetch(Arc::clone(&calls)))
            .await
            .expect("batch");

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].len(), 200);
        assert_eq!(calls[1].len(), 200);
        assert_eq!(calls[2].len(), 50);

        assert_eq!(merged.len(), 450);
        assert_eq!(merged, ids);
    }

    #[tokio::test]
    async fn empty_input_short_circuits_with_zero_calls() {
        let calls = Arc::new(Mutex::new(Vec::new()));

        let merged = process_batches(&[], 200, ErrorPolicy::Fail, recording_fetch(Arc::clone(&calls)))
            .await
            .expect("batch");

        assert!(merged.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_chunk_size_is_clamped() {
        let calls = Arc::new(Mutex::new(Vec::new()));

        process_batches(&[2, 1], 0, ErrorPolicy::Fail, recording_fetch(Arc::clone(&calls)))
            .await
            .expect("batch");

        assert_eq!(*calls.lock().unwrap(), vec![vec![1], vec![2]]);
    }

    #[tokio::test(start_paused = true)]
    async fn merge_preserves_chunk_order_despite_completion_order() {
        // Earlier chunks sleep longer, so they complete last.
        let fetch = |chunk: Vec<i32>| async move {
            let delay = Duration::from_millis(100 - u64::from(chunk[0] as u32));
            tokio::time::sleep(delay).await;
            Ok::<_, String>(chunk)
        };

        let merged = process_batches(&[1, 2, 3, 4, 5, 6], 2, ErrorPolicy::Fail, fetch)
            .await
            .expect("batch");

        assert_eq!(merged, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn fail_policy_reports_the_earliest_failing_chunk() {
        let fetch = |chunk: Vec<i32>| async move {
            if chunk[0] == 1 || chunk[0] == 21 {
                Err(format!("chunk starting at {}", chunk[0]))
            } else {
                Ok(chunk)
            }
        };

        let ids: Vec<i32> = (1..=30).collect();
        let err = process_batches(&ids, 10, ErrorPolicy::Fail, fetch)
            .await
            .expect_err("expected failure");

        assert_eq!(err, "chunk starting at 1");
    }

    #[tokio::test]
    async fn omit_policy_skips_failed_chunks_and_keeps_the_rest() {
        let fetch = |chunk: Vec<i32>| async move {
            if chunk[0] == 11 {
                Err("middle chunk failed".to_string())
            } else {
                Ok(chunk)
            }
        };

        let ids: Vec<i32> = (1..=30).collect();
        let merged = process_batches(&ids, 10, ErrorPolicy::Omit, fetch)
            .await
            .expect("omit keeps going");

        let expected: Vec<i32> = (1..=10).chain(21..=30).collect();
        assert_eq!(merged, expected);
    }

    #[test]
    fn error_policy_defaults_to_fail() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Fail);
    }
}
