//! In-memory implementations of the port traits.
//!
//! Available to this crate's tests and, behind the `test-support` feature, to
//! the tests of downstream crates.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    BuildCache, BuildError, BuildExecutor, CommitSha, FetchError, PullRequest, PullRequestNumber,
    PullRequestSource,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Serves canned pull requests or errors keyed by number.
///
/// Unknown numbers answer [`FetchError::NotFound`].
#[derive(Debug, Default)]
pub struct FakePullRequestSource {
    responses: Mutex<HashMap<PullRequestNumber, Result<PullRequest, FetchError>>>,
    fetches: AtomicUsize,
}

impl FakePullRequestSource {
    /// Creates a source with no pull requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `pr` for its number.
    pub fn insert(&self, pr: PullRequest) {
        lock(&self.responses).insert(pr.number, Ok(pr));
    }

    /// Fails every fetch of `number` with `err`.
    pub fn fail_with(&self, number: u64, err: FetchError) {
        lock(&self.responses).insert(PullRequestNumber::new(number), Err(err));
    }

    /// Number of fetches made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PullRequestSource for FakePullRequestSource {
    async fn fetch(&self, number: PullRequestNumber) -> Result<PullRequest, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        lock(&self.responses)
            .get(&number)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::NotFound {
                    url: format!("fake://pulls/{number}"),
                })
            })
    }
}

/// A set of commits considered published.
#[derive(Debug, Default)]
pub struct FakeBuildCache {
    entries: Mutex<HashSet<CommitSha>>,
}

impl FakeBuildCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `sha` as published.
    pub fn insert(&self, sha: CommitSha) {
        lock(&self.entries).insert(sha);
    }

    /// Returns `true` if `sha` is published.
    pub fn contains(&self, sha: &CommitSha) -> bool {
        lock(&self.entries).contains(sha)
    }
}

#[async_trait]
impl BuildCache for FakeBuildCache {
    async fn exists(&self, sha: &CommitSha) -> bool {
        self.contains(sha)
    }
}

/// Counts builds and, on success, publishes into a [`FakeBuildCache`].
#[derive(Debug, Default)]
pub struct FakeBuildExecutor {
    cache: Option<Arc<FakeBuildCache>>,
    builds: AtomicUsize,
    failures: Mutex<VecDeque<BuildError>>,
    delay: Mutex<Duration>,
}

impl FakeBuildExecutor {
    /// Creates an executor that publishes nowhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor that marks successful builds in `cache`.
    pub fn publishing_to(cache: Arc<FakeBuildCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Self::default()
        }
    }

    /// Queues `err` as the result of the next build.
    pub fn fail_next(&self, err: BuildError) {
        lock(&self.failures).push_back(err);
    }

    /// Makes every build take at least `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = delay;
    }

    /// Number of builds started so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildExecutor for FakeBuildExecutor {
    async fn build(&self, sha: &CommitSha) -> Result<(), BuildError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = lock(&self.failures).pop_front() {
            return Err(err);
        }
        if let Some(cache) = &self.cache {
            cache.insert(sha.clone());
        }
        Ok(())
    }
}
