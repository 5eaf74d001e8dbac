//! prbuild entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment variables, see
//!    [`config::Config`]. A missing output directory aborts startup.
//! 2. **Wire observability**: see [`telemetry`].
//! 3. **Construct infrastructure**: the GitHub metadata source, the on-disk
//!    build cache, and the checkout builder, injected into a
//!    [`pipeline::BuildTrigger`].
//! 4. **Serve**: bind `127.0.0.1:<port>` and answer trigger requests until
//!    SIGINT or SIGTERM.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use builder::{CheckoutBuilder, FsBuildCache};
use clap::Parser;
use github::GitHubPullRequestSource;
use pipeline::BuildTrigger;
use tracing::info;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(e) = &result {
        tracing::error!(error = ?e, "prbuild exited with an error");
    }
    telemetry.shutdown();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let cache = FsBuildCache::open(&config.output_dir)?;
    let recipe = config.recipe()?;

    let mut source = GitHubPullRequestSource::new(config.metadata_api.as_str())?;
    if let Some(token) = &config.github_token {
        source = source.with_token(token.as_str());
    }

    let trigger = Arc::new(BuildTrigger::new(
        Arc::new(source),
        Arc::new(cache.clone()),
        Arc::new(CheckoutBuilder::new(cache, recipe)),
        config.trust_policy()?,
        config.viewer()?,
    ));

    let socket = listener::bind_loopback(config.port)
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{}", config.port))?;
    info!(
        output_dir = %config.output_dir.display(),
        metadata_api = %config.metadata_api,
        "prbuild started"
    );
    listener::serve(socket, listener::router(trigger), shutdown_signal())
        .await
        .context("server error")?;

    info!("prbuild stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown requested");
}
