//! Core domain for prbuild, the pull-request build trigger.
//!
//! This crate contains every domain concept, newtype identifier, business rule,
//! and error type used throughout the service. Infrastructure crates implement
//! the port traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`PullRequestNumber`, `CommitSha`, etc.) |
//! | [`types`] | Shared value types (`PullRequest`, `ViewerBase`, etc.) |
//! | [`errors`] | Error taxonomy |
//! | [`trust`] | The trust gate |
//! | [`ports`] | Traits implemented by infrastructure crates |
//! | [`in_flight`] | Per-commit build serialization |
//! | [`service`] | Request orchestration |

pub mod errors;
pub mod identifiers;
pub mod in_flight;
pub mod ports;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod trust;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{BuildError, ConfigError, FetchError, TriggerError, TrustError};
pub use identifiers::{CommitSha, PullRequestNumber, RequestId, UserLogin};
pub use in_flight::{BuildSlot, InFlightBuilds};
pub use ports::{BuildCache, BuildExecutor, PullRequestSource};
pub use service::BuildTrigger;
pub use trust::TrustPolicy;
pub use types::{BuildOutcome, PullRequest, TrustedPullRequest, ViewerBase, ViewerLocation};
