use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use tokio::sync::Mutex;

use crate::anchor::Anchor;

#[derive(Debug, Default)]
struct Entries {
    anchors: Vec<Anchor>,
    seen: HashSet<i64>,
}

/// Append-only set of anchors shared by the day workers.
///
/// The lock is only held while a batch is copied in; searching happens
/// outside of it. Batches from one day stay contiguous, batches from
/// different days land in whatever order the days finish. A timestamp is
/// kept once no matter how many days report it.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    inner: Arc<Mutex<Entries>>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Add a day's anchors, returning how many were new.
    pub async fn append(&self, anchors: Vec<Anchor>) -> usize {
        if anchors.is_empty() {
            return 0;
        }
        let mut entries = self.inner.lock().await;
        let mut added = 0;
        for anchor in anchors {
            if entries.seen.insert(anchor.timestamp) {
                entries.anchors.push(anchor);
                added += 1;
            } else {
                debug!("already have {}", anchor.timestamp);
            }
        }
        added
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.anchors.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current contents in append order.
    pub async fn snapshot(&self) -> Vec<Anchor> {
        self.inner.lock().await.anchors.clone()
    }

    /// Contents ordered by timestamp.
    pub async fn sorted(&self) -> Vec<Anchor> {
        let mut anchors = self.snapshot().await;
        anchors.sort_by_key(|anchor| anchor.timestamp);
        anchors
    }
}
