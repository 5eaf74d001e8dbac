//! Request orchestration.
//!
//! [`BuildTrigger`] runs one request end to end:
//!
//! 1. parse the request path into a [`PullRequestNumber`];
//! 2. fetch metadata through the [`PullRequestSource`] port;
//! 3. apply the [`TrustPolicy`];
//! 4. on a cache miss, take the commit's in-flight slot, re-check the cache,
//!    and run the [`BuildExecutor`] if the commit is still unbuilt;
//! 5. return the viewer location for the commit.
//!
//! Every failure stops processing at that step and is returned to the caller.

use std::sync::Arc;

use tracing::{info, instrument, Span};

use crate::{
    BuildCache, BuildExecutor, BuildOutcome, InFlightBuilds, PullRequestNumber, PullRequestSource,
    RequestId, TriggerError, TrustPolicy, TrustedPullRequest, ViewerBase, ViewerLocation,
};

/// Handles trigger requests. Shared across all request tasks.
pub struct BuildTrigger {
    source: Arc<dyn PullRequestSource>,
    cache: Arc<dyn BuildCache>,
    executor: Arc<dyn BuildExecutor>,
    policy: TrustPolicy,
    viewer: ViewerBase,
    in_flight: InFlightBuilds,
}

impl BuildTrigger {
    /// Wires the ports together with the trust policy and viewer base URL.
    pub fn new(
        source: Arc<dyn PullRequestSource>,
        cache: Arc<dyn BuildCache>,
        executor: Arc<dyn BuildExecutor>,
        policy: TrustPolicy,
        viewer: ViewerBase,
    ) -> Self {
        Self {
            source,
            cache,
            executor,
            policy,
            viewer,
            in_flight: InFlightBuilds::new(),
        }
    }

    /// Handles one request for `path` and returns where to redirect the caller.
    #[instrument(
        name = "trigger",
        skip(self),
        fields(request_id = %RequestId::new_random(), pr, sha, outcome)
    )]
    pub async fn handle(&self, path: &str) -> Result<ViewerLocation, TriggerError> {
        let number = PullRequestNumber::from_path(path).ok_or(TriggerError::BadPath)?;
        Span::current().record("pr", number.as_u64());

        let pr = self.source.fetch(number).await?;
        let trusted = self.policy.evaluate(&pr)?;
        Span::current().record("sha", trusted.head_sha.as_str());

        let outcome = self.ensure_built(&trusted).await?;
        Span::current().record("outcome", tracing::field::display(outcome));
        info!(author = %trusted.author, "request satisfied");

        Ok(self.viewer.location_for(&trusted.head_sha))
    }

    async fn ensure_built(&self, pr: &TrustedPullRequest) -> Result<BuildOutcome, TriggerError> {
        let sha = &pr.head_sha;
        if self.cache.exists(sha).await {
            return Ok(BuildOutcome::CacheHit);
        }

        let _slot = self.in_flight.acquire(sha).await;
        // Another request may have published while we waited for the slot.
        if self.cache.exists(sha).await {
            return Ok(BuildOutcome::CacheHit);
        }

        info!("no cached build; starting pipeline");
        self.executor.build(sha).await?;
        Ok(BuildOutcome::Built)
    }
}
