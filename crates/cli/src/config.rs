//! Command-line and environment configuration.
//!
//! Every value can come from a flag or an environment variable; flags win.
//! Defaults reproduce the single deployment this service was written for.

use std::path::PathBuf;

use builder::{BuildRecipe, CommandLine};
use clap::{Parser, ValueEnum};
use pipeline::{ConfigError, TrustPolicy, UserLogin, ViewerBase};

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Builds pull requests on demand and redirects to the published build.
#[derive(Debug, Clone, Parser)]
#[command(name = "prbuild", version, about)]
pub struct Config {
    /// Port to listen on (loopback only).
    #[arg(long, env = "PRBUILD_PORT", default_value_t = 8081)]
    pub port: u16,

    /// Shared node_modules (or other dependency) directory to link into each build.
    #[arg(long = "base-node-modules", env = "PRBUILD_BASE_NODE_MODULES")]
    pub base_node_modules: Option<PathBuf>,

    /// Directory builds are published into, one subdirectory per commit.
    #[arg(long, env = "PRBUILD_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Pull-request collection URL of the GitHub REST API.
    #[arg(
        long,
        env = "PRBUILD_METADATA_API",
        default_value = "https://api.github.com/repos/Kegsay/github-pull-review/pulls"
    )]
    pub metadata_api: String,

    /// Repository cloned for every build.
    #[arg(
        long,
        env = "PRBUILD_SOURCE_REPOSITORY",
        default_value = "https://github.com/illicitonion/github-pull-review.git"
    )]
    pub source_repository: String,

    /// Viewer that serves published builds under `/shas/<sha>`.
    #[arg(long, env = "PRBUILD_VIEWER_BASE", default_value = "https://review.rocks")]
    pub viewer_base: String,

    /// GitHub login allowed to trigger builds. Repeat or comma-separate for several.
    #[arg(
        long = "allowed-author",
        env = "PRBUILD_ALLOWED_AUTHORS",
        value_delimiter = ',',
        default_value = "illicitonion"
    )]
    pub allowed_authors: Vec<String>,

    /// Dependency install command, split on whitespace.
    #[arg(long, env = "PRBUILD_INSTALL_COMMAND", default_value = "npm install")]
    pub install_command: CommandLine,

    /// Build command, split on whitespace.
    #[arg(long, env = "PRBUILD_BUILD_COMMAND", default_value = "npm run build")]
    pub build_command: CommandLine,

    /// Directory the build command writes, relative to the checkout.
    #[arg(long, env = "PRBUILD_BUILD_OUTPUT", default_value = "build")]
    pub build_output: PathBuf,

    /// Token for GitHub API requests.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Log line encoding.
    #[arg(long, env = "PRBUILD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP (gRPC) endpoint to export spans to.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// The author allow-list.
    pub fn trust_policy(&self) -> Result<TrustPolicy, ConfigError> {
        let authors = self
            .allowed_authors
            .iter()
            .map(|login| {
                UserLogin::new(login.trim())
                    .ok_or_else(|| ConfigError::new("allowed author must not be empty"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        TrustPolicy::new(authors)
    }

    /// The viewer base URL.
    pub fn viewer(&self) -> Result<ViewerBase, ConfigError> {
        ViewerBase::new(self.viewer_base.as_str())
            .ok_or_else(|| ConfigError::new("viewer base URL must not be empty"))
    }

    /// The build recipe. The base dependency directory must exist and is
    /// made absolute so the link resolves from inside the workspace.
    pub fn recipe(&self) -> Result<BuildRecipe, ConfigError> {
        if self.build_output.as_os_str().is_empty() || self.build_output.is_absolute() {
            return Err(ConfigError::new(
                "build output must be a path relative to the checkout",
            ));
        }
        let base_dependency_dir = self
            .base_node_modules
            .as_ref()
            .map(|dir| {
                std::fs::canonicalize(dir).map_err(|e| {
                    ConfigError::new(format!("base dependency directory {}: {e}", dir.display()))
                })
            })
            .transpose()?;
        Ok(BuildRecipe {
            source_repository: self.source_repository.clone(),
            base_dependency_dir,
            install: self.install_command.clone(),
            build: self.build_command.clone(),
            output_dir: self.build_output.clone(),
        })
    }
}
