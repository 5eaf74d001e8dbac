//! Shared value types for the prbuild domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types group
//! several values together and carry the per-request state that flows between
//! the fetcher, the trust gate, and the build cache.

use serde::{Deserialize, Serialize};

use crate::{CommitSha, PullRequestNumber, UserLogin};

// ---------------------------------------------------------------------------
// Pull requests
// ---------------------------------------------------------------------------

/// Pull-request metadata as decoded from the hosted API, before any checks.
///
/// The values are kept raw so the trust gate can echo them back verbatim in
/// its rejection messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// The number the metadata was fetched for.
    pub number: PullRequestNumber,
    /// Commit at the tip of the pull request's branch (`head.sha`).
    pub head_sha: String,
    /// Login of the pull request's author (`user.login`).
    pub author_login: String,
}

/// A [`PullRequest`] that passed the trust gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedPullRequest {
    /// The pull request number.
    pub number: PullRequestNumber,
    /// Validated head commit.
    pub head_sha: CommitSha,
    /// Allow-listed author.
    pub author: UserLogin,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a successful request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    /// A published build already existed for the commit.
    CacheHit,
    /// The commit was built and published by this request.
    Built,
}

impl std::fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CacheHit => f.write_str("cache_hit"),
            Self::Built => f.write_str("built"),
        }
    }
}

// ---------------------------------------------------------------------------
// Viewer URLs
// ---------------------------------------------------------------------------

/// Base URL of the viewer that serves published builds (e.g.
/// `"https://review.rocks"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerBase(String);

impl ViewerBase {
    /// Creates a [`ViewerBase`], trimming any trailing `/`.
    ///
    /// Returns `None` if nothing remains after trimming.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let trimmed = v.trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Returns the viewer location for a published commit:
    /// `<base>/shas/<sha>`.
    pub fn location_for(&self, sha: &CommitSha) -> ViewerLocation {
        ViewerLocation(format!("{}/shas/{}", self.0, sha))
    }

    /// Returns the base URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Absolute URL the caller is redirected to after a successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerLocation(String);

impl ViewerLocation {
    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewerLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
