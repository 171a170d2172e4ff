//! FIFO job queue for long-lived workers
//!
//! The queue is filled once, before any worker starts: every job, then one
//! termination marker per worker. Workers pop until they see a marker, so
//! each worker consumes exactly one marker and exits. Every popped item is
//! acknowledged through a [`Claim`] guard, and [`JobQueue::join`] waits
//! until all `jobs + markers` items are acknowledged.
//!
//! A worker that never starts (or dies) calls [`JobQueue::retire_worker`],
//! which acknowledges one marker on its behalf. When the last worker
//! retires, the remaining jobs are handed back to the caller to be reported
//! as failed.

use crate::identifier::Identifier;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// One queued item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    Job(Identifier),
    Terminate,
}

/// Pre-loaded job queue shared by the stateful workers
#[derive(Debug)]
pub struct JobQueue {
    items: Mutex<VecDeque<QueueItem>>,
    total: usize,
    acknowledged: AtomicUsize,
    active_workers: AtomicUsize,
    drained: Notify,
}

impl JobQueue {
    /// Builds a queue holding `jobs` followed by `workers` markers
    pub fn new(jobs: Vec<Identifier>, workers: usize) -> Self {
        let mut items: VecDeque<QueueItem> = jobs.into_iter().map(QueueItem::Job).collect();
        items.extend(std::iter::repeat(QueueItem::Terminate).take(workers));

        Self {
            total: items.len(),
            items: Mutex::new(items),
            acknowledged: AtomicUsize::new(0),
            active_workers: AtomicUsize::new(workers),
            drained: Notify::new(),
        }
    }

    /// Total items enqueued (jobs plus markers)
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn acknowledged(&self) -> usize {
        self.acknowledged.load(Ordering::SeqCst)
    }

    /// Items not yet popped
    pub fn pending(&self) -> usize {
        self.lock_items().len()
    }

    /// Takes the next item in FIFO order
    ///
    /// The returned claim acknowledges the item when dropped, including
    /// during unwinding.
    pub fn pop(&self) -> Option<Claim<'_>> {
        let item = self.lock_items().pop_front()?;
        Some(Claim { queue: self, item })
    }

    /// Gives up one worker's marker without the worker having consumed it
    ///
    /// Returns the jobs nobody is left to process when this was the last
    /// active worker; they are acknowledged here.
    pub fn retire_worker(&self) -> Vec<Identifier> {
        {
            let mut items = self.lock_items();
            if matches!(items.back(), Some(QueueItem::Terminate)) {
                items.pop_back();
                drop(items);
                self.task_done();
            }
        }

        if self.active_workers.fetch_sub(1, Ordering::SeqCst) != 1 {
            return Vec::new();
        }

        let orphaned: Vec<QueueItem> = self.lock_items().drain(..).collect();
        let mut jobs = Vec::new();
        for item in orphaned {
            if let QueueItem::Job(identifier) = item {
                jobs.push(identifier);
            }
            self.task_done();
        }
        jobs
    }

    /// Marks a worker as exited after consuming its marker
    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    /// Waits until every enqueued item has been acknowledged
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.acknowledged() >= self.total {
                return;
            }
            notified.await;
        }
    }

    fn task_done(&self) {
        let done = self.acknowledged.fetch_add(1, Ordering::SeqCst) + 1;
        if done >= self.total {
            self.drained.notify_waiters();
        }
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, VecDeque<QueueItem>> {
        // Item moves never panic while holding the lock
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A popped queue item, acknowledged on drop
#[derive(Debug)]
pub struct Claim<'a> {
    queue: &'a JobQueue,
    item: QueueItem,
}

impl Claim<'_> {
    pub fn item(&self) -> &QueueItem {
        &self.item
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn ids(values: &[&str]) -> Vec<Identifier> {
        values.iter().map(|v| Identifier::parse(v).unwrap()).collect()
    }

    #[test]
    fn test_jobs_then_markers_in_fifo_order() {
        let queue = JobQueue::new(ids(&["0x1", "0x2"]), 2);
        assert_eq!(queue.total(), 4);

        let mut seen = Vec::new();
        while let Some(claim) = queue.pop() {
            seen.push(claim.item().clone());
        }

        assert_eq!(
            seen,
            vec![
                QueueItem::Job(Identifier::parse("0x1").unwrap()),
                QueueItem::Job(Identifier::parse("0x2").unwrap()),
                QueueItem::Terminate,
                QueueItem::Terminate,
            ]
        );
        assert_eq!(queue.acknowledged(), 4);
    }

    #[tokio::test]
    async fn test_join_waits_for_every_ack() {
        let queue = Arc::new(JobQueue::new(ids(&["0x1"]), 1));

        let first = queue.pop().map(|c| c.item().clone());
        assert!(matches!(first, Some(QueueItem::Job(_))));
        assert_eq!(queue.acknowledged(), 1);

        let pending = tokio::time::timeout(Duration::from_millis(20), queue.join()).await;
        assert!(pending.is_err());

        let worker = queue.clone();
        tokio::spawn(async move {
            let claim = worker.pop();
            assert!(matches!(claim.as_ref().map(|c| c.item()), Some(QueueItem::Terminate)));
        });

        tokio::time::timeout(Duration::from_secs(1), queue.join())
            .await
            .unwrap();
        assert_eq!(queue.acknowledged(), 2);
    }

    #[test]
    fn test_retire_acknowledges_one_marker() {
        let queue = JobQueue::new(ids(&["0x1", "0x2"]), 2);

        let orphaned = queue.retire_worker();
        assert!(orphaned.is_empty());
        assert_eq!(queue.acknowledged(), 1);
        assert_eq!(queue.pending(), 3);
    }

    #[test]
    fn test_last_retirement_returns_orphaned_jobs() {
        let queue = JobQueue::new(ids(&["0x1", "0x2", "0x3"]), 2);

        drop(queue.pop());
        assert!(queue.retire_worker().is_empty());
        let orphaned = queue.retire_worker();

        assert_eq!(orphaned, ids(&["0x2", "0x3"]));
        assert_eq!(queue.acknowledged(), queue.total());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_claim_acks_on_unwind() {
        let queue = JobQueue::new(ids(&["0x1"]), 1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _claim = queue.pop();
            panic!("worker died mid-job");
        }));

        assert!(result.is_err());
        assert_eq!(queue.acknowledged(), 1);
    }
}
