use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use crate::error::{AppError, Result};
use crate::models::Verdict;
use crate::sheets::ReviewStore;

use super::cache::{RecordCache, Ticket};

/// An approve/reject that has been applied locally and awaits the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReview {
    pub row: u32,
    pub verdict: Verdict,
    ticket: Ticket,
}

/// Result of a dispatched write, handed back to `settle`.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub review: PendingReview,
    pub result: Result<()>,
}

/// Runs approve/reject as an optimistic write: patch the cache, write the
/// flag cell, then keep the patch or roll it back.
///
/// The three steps are separate so the UI can spawn the write and keep
/// handling keys; `review` chains them for callers that can simply wait.
pub struct ReviewOrchestrator {
    store: Arc<dyn ReviewStore>,
    write_timeout: Duration,
}

impl ReviewOrchestrator {
    pub fn new(store: Arc<dyn ReviewStore>, write_timeout: Duration) -> Self {
        Self {
            store,
            write_timeout,
        }
    }

    pub fn store(&self) -> Arc<dyn ReviewStore> {
        Arc::clone(&self.store)
    }

    pub fn begin(
        &self,
        cache: &mut RecordCache,
        row: u32,
        verdict: Verdict,
    ) -> Result<PendingReview> {
        let ticket = cache.begin(row, verdict.decision())?;
        tracing::debug!(row, ?verdict, "Applied optimistic review");
        Ok(PendingReview {
            row,
            verdict,
            ticket,
        })
    }

    /// The remote write, bounded by the write timeout. Owns everything it
    /// needs so it can be spawned.
    pub fn dispatch(&self, review: PendingReview) -> BoxFuture<'static, ReviewOutcome> {
        let store = self.store();
        let timeout = self.write_timeout;

        async move {
            let write = store.write_review_flag(review.row, review.verdict);
            let result = match tokio::time::timeout(timeout, write).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Remote(format!(
                    "write to row {} timed out after {}s",
                    review.row,
                    timeout.as_secs()
                ))),
            };
            ReviewOutcome { review, result }
        }
        .boxed()
    }

    /// Keep or revert the optimistic patch. The write's error is returned
    /// for display; the cache is already consistent either way.
    pub fn settle(&self, cache: &mut RecordCache, outcome: ReviewOutcome) -> Result<()> {
        let ReviewOutcome { review, result } = outcome;

        match result {
            Ok(()) => {
                if !cache.commit(review.row, review.ticket) {
                    tracing::debug!(row = review.row, "Write confirmed after cache reload");
                }
                tracing::info!(row = review.row, verdict = ?review.verdict, "Review saved");
                Ok(())
            }
            Err(e) => {
                let reverted = cache.rollback(review.row, review.ticket);
                tracing::error!(row = review.row, reverted, "Review write failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn review(&self, cache: &mut RecordCache, row: u32, verdict: Verdict) -> Result<()> {
        let pending = self.begin(cache, row, verdict)?;
        let outcome = self.dispatch(pending).await;
        self.settle(cache, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReviewError;
    use crate::models::{test_record as record, Decision};
    use crate::sheets::memory::MemoryStore;
    use crate::sheets::mapper::COLUMN_COUNT;

    use async_trait::async_trait;

    fn setup(store: Arc<MemoryStore>) -> (ReviewOrchestrator, RecordCache) {
        let orchestrator = ReviewOrchestrator::new(store, Duration::from_secs(5));
        let cache = RecordCache::from_records(vec![record(5, Decision::Unreviewed)]);
        (orchestrator, cache)
    }

    #[tokio::test]
    async fn failed_write_rolls_back() {
        let store = Arc::new(MemoryStore::default());
        store.fail_writes(true);
        let (orchestrator, mut cache) = setup(Arc::clone(&store));

        let result = orchestrator.review(&mut cache, 5, Verdict::Approve).await;

        assert!(matches!(result, Err(AppError::Remote(_))));
        assert_eq!(cache.get(5).unwrap().decision, Decision::Unreviewed);
        assert!(!cache.is_pending(5));
        assert_eq!(store.writes(), vec![(5, Verdict::Approve)]);
    }

    #[tokio::test]
    async fn successful_write_keeps_optimistic_state() {
        let store = Arc::new(MemoryStore::with_rows(vec![vec![]; 4]));
        let (orchestrator, mut cache) = setup(Arc::clone(&store));

        orchestrator
            .review(&mut cache, 5, Verdict::Reject)
            .await
            .unwrap();

        assert_eq!(cache.get(5).unwrap().decision, Decision::Rejected);
        assert!(!cache.has_pending());
        assert_eq!(store.cell(5, COLUMN_COUNT - 1).as_deref(), Some("FALSE"));
    }

    #[tokio::test]
    async fn retry_after_failure_succeeds() {
        let store = Arc::new(MemoryStore::with_rows(vec![vec![]; 4]));
        store.fail_writes(true);
        let (orchestrator, mut cache) = setup(Arc::clone(&store));

        assert!(orchestrator.review(&mut cache, 5, Verdict::Approve).await.is_err());
        store.fail_writes(false);
        orchestrator
            .review(&mut cache, 5, Verdict::Approve)
            .await
            .unwrap();

        assert_eq!(cache.get(5).unwrap().decision, Decision::Approved);
    }

    #[tokio::test]
    async fn begin_is_visible_before_the_write_completes() {
        let store = Arc::new(MemoryStore::default());
        let (orchestrator, mut cache) = setup(store);

        let pending = orchestrator.begin(&mut cache, 5, Verdict::Approve).unwrap();

        assert_eq!(cache.get(5).unwrap().decision, Decision::Approved);
        assert!(matches!(
            orchestrator.begin(&mut cache, 5, Verdict::Reject),
            Err(AppError::Review(ReviewError::AlreadyPending(5)))
        ));

        let outcome = orchestrator.dispatch(pending).await;
        orchestrator.settle(&mut cache, outcome).unwrap();
        assert!(!cache.is_pending(5));
    }

    #[tokio::test]
    async fn unknown_row_never_reaches_the_store() {
        let store = Arc::new(MemoryStore::default());
        let (orchestrator, mut cache) = setup(Arc::clone(&store));

        let result = orchestrator.review(&mut cache, 99, Verdict::Approve).await;

        assert!(matches!(
            result,
            Err(AppError::Review(ReviewError::UnknownRow(99)))
        ));
        assert!(store.writes().is_empty());
    }

    struct StalledStore;

    #[async_trait]
    impl ReviewStore for StalledStore {
        async fn read_all(&self) -> Result<Vec<Vec<String>>> {
            Ok(Vec::new())
        }

        async fn write_review_flag(&self, _row: u32, _verdict: Verdict) -> Result<()> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_write_times_out_and_rolls_back() {
        let orchestrator = ReviewOrchestrator::new(Arc::new(StalledStore), Duration::from_secs(15));
        let mut cache = RecordCache::from_records(vec![record(5, Decision::Rejected)]);

        let result = orchestrator.review(&mut cache, 5, Verdict::Approve).await;

        assert!(matches!(result, Err(AppError::Remote(msg)) if msg.contains("timed out")));
        assert_eq!(cache.get(5).unwrap().decision, Decision::Rejected);
    }

    #[test]
    fn dispatch_reports_the_row_it_wrote() {
        let store = Arc::new(MemoryStore::with_rows(vec![vec![]; 4]));
        let (orchestrator, mut cache) = setup(Arc::clone(&store));
        let pending = orchestrator.begin(&mut cache, 5, Verdict::Approve).unwrap();

        let outcome = tokio_test::block_on(orchestrator.dispatch(pending));

        assert!(outcome.result.is_ok());
        assert_eq!(outcome.review.row, 5);
        assert_eq!(outcome.review.verdict, Verdict::Approve);
        // Settling is the caller's job; the cache still shows it in flight
        assert!(cache.is_pending(5));
    }
}
