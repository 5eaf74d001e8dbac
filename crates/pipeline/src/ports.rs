//! Port traits implemented by the infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`PullRequestSource`] | `github::GitHubPullRequestSource` |
//! | [`BuildCache`] | `builder::FsBuildCache` |
//! | [`BuildExecutor`] | `builder::CheckoutBuilder` |

use async_trait::async_trait;

use crate::{BuildError, CommitSha, FetchError, PullRequest, PullRequestNumber};

/// Retrieves pull-request metadata from the hosted code-review API.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetches and decodes the metadata for `number`. No retries.
    async fn fetch(&self, number: PullRequestNumber) -> Result<PullRequest, FetchError>;
}

/// Answers whether a commit already has a published build.
#[async_trait]
pub trait BuildCache: Send + Sync {
    /// Returns `true` if an entry exists for `sha`. Existence alone counts;
    /// entry contents are never re-validated.
    async fn exists(&self, sha: &CommitSha) -> bool;
}

/// Produces and publishes a build for one commit.
#[async_trait]
pub trait BuildExecutor: Send + Sync {
    /// Builds `sha` and publishes it so that [`BuildCache::exists`] returns
    /// `true` afterwards. Stops at the first failing step.
    ///
    /// Callers serialize invocations per commit; implementations need not
    /// guard against concurrent builds of the same SHA.
    async fn build(&self, sha: &CommitSha) -> Result<(), BuildError>;
}
