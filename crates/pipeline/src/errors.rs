//! Error taxonomy for the prbuild request pipeline.
//!
//! [`TriggerError`] is what the request boundary sees: every variant is
//! reported to the caller as `400 Bad Request` with the variant's `Display`
//! text as the body. Component-level errors ([`FetchError`], [`TrustError`],
//! [`BuildError`]) are produced by the port implementations and the trust gate
//! and wrapped transparently so their text reaches the caller unchanged.
//!
//! Nothing here is retried. [`ConfigError`] is the only error that is fatal to
//! the process, and it can only occur at startup.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Request-level errors
// ---------------------------------------------------------------------------

/// Any reason a trigger request was rejected.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The request path is not `/` followed by one or more decimal digits.
    #[error("Bad PR")]
    BadPath,

    /// Pull-request metadata could not be retrieved or decoded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The pull request did not pass the trust gate.
    #[error(transparent)]
    Trust(#[from] TrustError),

    /// A build pipeline step failed.
    #[error(transparent)]
    Build(#[from] BuildError),
}

// ---------------------------------------------------------------------------
// Component errors
// ---------------------------------------------------------------------------

/// Failures retrieving pull-request metadata from the hosted API.
///
/// Status-code failures are kept apart from decode failures so that "the pull
/// request does not exist" is never mistaken for "the API returned garbage".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The HTTP call could not be completed (DNS, connect, TLS, body read).
    #[error("metadata request failed: {message}")]
    Transport {
        /// Description from the HTTP client.
        message: String,
    },

    /// The API answered `404 Not Found`.
    #[error("pull request not found: {url}")]
    NotFound {
        /// URL that was requested.
        url: String,
    },

    /// The API answered `401 Unauthorized` or `403 Forbidden`.
    ///
    /// GitHub also uses `403` for exhausted rate limits.
    #[error("access to pull request denied ({status}): {url}")]
    Forbidden {
        /// URL that was requested.
        url: String,
        /// Numeric HTTP status.
        status: u16,
    },

    /// Any other non-success status.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// URL that was requested.
        url: String,
        /// Numeric HTTP status.
        status: u16,
    },

    /// A success response whose body is not the expected JSON shape.
    #[error("malformed pull request metadata: {message}")]
    Decode {
        /// Description from the JSON decoder.
        message: String,
    },
}

/// Trust-gate rejections. The offending value is embedded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// The head SHA is not 40 lowercase hex characters.
    #[error("Bad SHA: {0}")]
    BadSha(String),

    /// The pull-request author is not on the allow-list.
    #[error("Wrong user: {0}")]
    WrongUser(String),
}

/// Failures in the clone → checkout → link → install → build → publish pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The scratch workspace could not be created.
    #[error("failed to create build workspace: {message}")]
    Workspace {
        /// Underlying I/O error text.
        message: String,
    },

    /// A subprocess step could not be spawned or exited unsuccessfully.
    #[error("{step} failed: {message}")]
    Step {
        /// Human-readable step name (e.g. `"git clone"`).
        step: String,
        /// Exit status or spawn error text.
        message: String,
    },

    /// The shared dependency directory could not be linked into the workspace.
    #[error("failed to link dependency directory {path}: {message}")]
    Link {
        /// Configured base dependency directory.
        path: String,
        /// Underlying I/O error text.
        message: String,
    },

    /// The build output could not be moved into the cache.
    #[error("failed to publish build for {sha}: {message}")]
    Publish {
        /// Commit being published.
        sha: String,
        /// Underlying error text.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Startup errors
// ---------------------------------------------------------------------------

/// The runtime configuration is invalid.
///
/// Produced at load time; the service never starts with an invalid config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigError {
    /// Description of the configuration problem.
    pub message: String,
}

impl ConfigError {
    /// Creates a [`ConfigError`] from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_errors_embed_the_offending_value() {
        assert_eq!(TrustError::BadSha("XYZ".into()).to_string(), "Bad SHA: XYZ");
        assert_eq!(
            TrustError::WrongUser("mallory".into()).to_string(),
            "Wrong user: mallory"
        );
    }

    #[test]
    fn trigger_error_is_transparent_over_components() {
        let err = TriggerError::from(BuildError::Step {
            step: "npm install".into(),
            message: "exit status: 1".into(),
        });
        assert_eq!(err.to_string(), "npm install failed: exit status: 1");
        assert_eq!(TriggerError::BadPath.to_string(), "Bad PR");
    }
}
