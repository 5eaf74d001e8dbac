//! Per-commit build serialization.
//!
//! [`InFlightBuilds`] hands out one [`BuildSlot`] per commit at a time.
//! Requests for the same SHA queue on the slot; requests for different SHAs
//! never contend. Entries are removed once the last holder or waiter is gone,
//! so the registry only ever contains commits with a build in progress.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::CommitSha;

type Slots = HashMap<CommitSha, Arc<AsyncMutex<()>>>;

/// Registry of commits with a build in progress.
#[derive(Debug, Default)]
pub struct InFlightBuilds {
    slots: Mutex<Slots>,
}

impl InFlightBuilds {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder owns the slot for `sha`, then takes it.
    pub async fn acquire(&self, sha: &CommitSha) -> BuildSlot<'_> {
        let slot = Arc::clone(self.lock_slots().entry(sha.clone()).or_default());
        let guard = slot.lock_owned().await;
        BuildSlot {
            registry: self,
            sha: sha.clone(),
            guard: Some(guard),
        }
    }

    /// Number of commits currently holding or waiting on a slot.
    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    /// Returns `true` if no build is in progress.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_slots(&self) -> MutexGuard<'_, Slots> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive right to build one commit. Released on drop.
#[derive(Debug)]
pub struct BuildSlot<'a> {
    registry: &'a InFlightBuilds,
    sha: CommitSha,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BuildSlot<'_> {
    /// The commit this slot guards.
    pub fn sha(&self) -> &CommitSha {
        &self.sha
    }
}

impl Drop for BuildSlot<'_> {
    fn drop(&mut self) {
        let mut slots = self.registry.lock_slots();
        // Waiters clone the Arc under the map lock, so once our guard is gone
        // a count of one means only the map still references the slot.
        drop(self.guard.take());
        if slots
            .get(&self.sha)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.sha);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn sha(c: char) -> CommitSha {
        CommitSha::parse(&c.to_string().repeat(40)).unwrap()
    }

    #[tokio::test]
    async fn slot_is_removed_after_release() {
        let registry = InFlightBuilds::new();
        {
            let slot = registry.acquire(&sha('a')).await;
            assert_eq!(slot.sha(), &sha('a'));
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn different_commits_do_not_contend() {
        let registry = InFlightBuilds::new();
        let _a = registry.acquire(&sha('a')).await;
        let b = tokio::time::timeout(Duration::from_secs(1), registry.acquire(&sha('b'))).await;
        assert!(b.is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_commit_is_held_by_one_task_at_a_time() {
        let registry = Arc::new(InFlightBuilds::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _slot = registry.acquire(&sha('c')).await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }
}
