//! The trust gate.
//!
//! A coarse single-tenant gate that stops third parties from triggering builds
//! of their own forks through the service. It is not an authorization system.

use crate::{CommitSha, ConfigError, PullRequest, TrustError, TrustedPullRequest, UserLogin};

/// Authors whose pull requests may be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    allowed_authors: Vec<UserLogin>,
}

impl TrustPolicy {
    /// Creates a policy from a non-empty allow-list.
    pub fn new(allowed_authors: Vec<UserLogin>) -> Result<Self, ConfigError> {
        if allowed_authors.is_empty() {
            return Err(ConfigError::new("at least one allowed author is required"));
        }
        Ok(Self { allowed_authors })
    }

    /// Returns the configured allow-list.
    pub fn allowed_authors(&self) -> &[UserLogin] {
        &self.allowed_authors
    }

    /// Checks the head SHA shape, then the author.
    ///
    /// The SHA check runs first, so a pull request failing both is reported
    /// as `Bad SHA`. Login comparison is exact.
    pub fn evaluate(&self, pr: &PullRequest) -> Result<TrustedPullRequest, TrustError> {
        let head_sha =
            CommitSha::parse(&pr.head_sha).ok_or_else(|| TrustError::BadSha(pr.head_sha.clone()))?;

        let author = self
            .allowed_authors
            .iter()
            .find(|login| login.as_str() == pr.author_login)
            .cloned()
            .ok_or_else(|| TrustError::WrongUser(pr.author_login.clone()))?;

        Ok(TrustedPullRequest {
            number: pr.number,
            head_sha,
            author,
        })
    }
}
