//! prbuild build infrastructure.
//!
//! Implements two of the [`pipeline`] ports:
//!
//! - [`FsBuildCache`] ([`pipeline::BuildCache`]): one directory per built
//!   commit under the configured output root.
//! - [`CheckoutBuilder`] ([`pipeline::BuildExecutor`]): clones the source
//!   repository into a scratch [`BuildWorkspace`], checks out the commit,
//!   optionally links a shared dependency directory, runs the install and
//!   build commands, and publishes the output with one atomic rename.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Subprocesses and filesystem access live here. Callers
//! serialize builds per commit (see [`pipeline::InFlightBuilds`]).
//!
//! Unix-only: dependency directories are linked with symbolic links.

pub mod cache;
pub mod command;
pub mod executor;
pub mod workspace;

pub use cache::FsBuildCache;
pub use command::{CommandFailure, CommandLine, CommandRunner, ProcessRunner};
pub use executor::{BuildRecipe, CheckoutBuilder};
pub use workspace::{BuildWorkspace, WORKSPACE_PREFIX};
