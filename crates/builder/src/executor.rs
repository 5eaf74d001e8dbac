//! The clone → checkout → link → install → build → publish pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use pipeline::{BuildError, BuildExecutor, CommitSha};
use tracing::{debug, info, instrument};

use crate::{BuildWorkspace, CommandLine, CommandRunner, FsBuildCache, ProcessRunner};

/// What to build and how.
#[derive(Debug, Clone)]
pub struct BuildRecipe {
    /// Repository cloned for every build.
    pub source_repository: String,
    /// Shared dependency directory linked into each workspace, if any.
    pub base_dependency_dir: Option<PathBuf>,
    /// Dependency install command.
    pub install: CommandLine,
    /// Build command.
    pub build: CommandLine,
    /// Directory, relative to the checkout, that the build command fills.
    pub output_dir: PathBuf,
}

impl BuildRecipe {
    /// Recipe for an npm project: `npm install`, `npm run build`, output in
    /// `build/`.
    pub fn npm(source_repository: impl Into<String>) -> Self {
        Self {
            source_repository: source_repository.into(),
            base_dependency_dir: None,
            install: CommandLine::new("npm", ["install"]),
            build: CommandLine::new("npm", ["run", "build"]),
            output_dir: PathBuf::from("build"),
        }
    }
}

/// Builds commits of one repository and publishes them into an [`FsBuildCache`].
pub struct CheckoutBuilder {
    cache: FsBuildCache,
    recipe: BuildRecipe,
    runner: Arc<dyn CommandRunner>,
}

impl CheckoutBuilder {
    /// Creates a builder that spawns real processes.
    pub fn new(cache: FsBuildCache, recipe: BuildRecipe) -> Self {
        Self::with_runner(cache, recipe, Arc::new(ProcessRunner))
    }

    /// Creates a builder that runs its commands through `runner`.
    pub fn with_runner(
        cache: FsBuildCache,
        recipe: BuildRecipe,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            cache,
            recipe,
            runner,
        }
    }

    async fn step(&self, dir: &Path, name: &str, command: &CommandLine) -> Result<(), BuildError> {
        let started = Instant::now();
        info!(step = name, command = %command, "running build step");
        self.runner
            .run(dir, command)
            .await
            .map_err(|e| BuildError::Step {
                step: name.to_owned(),
                message: e.to_string(),
            })?;
        info!(
            step = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "build step finished"
        );
        Ok(())
    }

    async fn link_dependencies(&self, workspace: &BuildWorkspace) -> Result<(), BuildError> {
        let Some(base) = &self.recipe.base_dependency_dir else {
            return Ok(());
        };
        let link_error = |message: String| BuildError::Link {
            path: base.display().to_string(),
            message,
        };
        let name = base
            .file_name()
            .ok_or_else(|| link_error("path has no final component".into()))?;
        tokio::fs::symlink(base, workspace.join(name))
            .await
            .map_err(|e| link_error(e.to_string()))?;
        debug!(dependency_dir = %base.display(), "linked dependency directory");
        Ok(())
    }

    async fn run_steps(
        &self,
        workspace: &BuildWorkspace,
        sha: &CommitSha,
    ) -> Result<(), BuildError> {
        let dir = workspace.path();

        let clone = CommandLine::new("git", ["clone", self.recipe.source_repository.as_str(), "."]);
        self.step(dir, "git clone", &clone).await?;

        let checkout = CommandLine::new("git", ["checkout", sha.as_str()]);
        self.step(dir, "git checkout", &checkout).await?;

        self.link_dependencies(workspace).await?;

        self.step(dir, &self.recipe.install.to_string(), &self.recipe.install)
            .await?;
        self.step(dir, &self.recipe.build.to_string(), &self.recipe.build)
            .await?;

        self.publish(workspace, sha).await
    }

    async fn publish(&self, workspace: &BuildWorkspace, sha: &CommitSha) -> Result<(), BuildError> {
        let publish_error = |message: String| BuildError::Publish {
            sha: sha.to_string(),
            message,
        };
        let output = workspace.join(&self.recipe.output_dir);
        match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(publish_error(format!(
                    "build output directory {} is missing",
                    self.recipe.output_dir.display()
                )))
            }
        }
        // An empty entry would be served as a finished build forever.
        let mut listing = tokio::fs::read_dir(&output)
            .await
            .map_err(|e| publish_error(e.to_string()))?;
        if listing
            .next_entry()
            .await
            .map_err(|e| publish_error(e.to_string()))?
            .is_none()
        {
            return Err(publish_error(format!(
                "build output directory {} is empty",
                self.recipe.output_dir.display()
            )));
        }

        let entry = self.cache.entry_path(sha);
        tokio::fs::rename(&output, &entry)
            .await
            .map_err(|e| publish_error(e.to_string()))?;
        info!(entry = %entry.display(), "build published");
        Ok(())
    }
}

#[async_trait]
impl BuildExecutor for CheckoutBuilder {
    #[instrument(skip_all, fields(sha = %sha))]
    async fn build(&self, sha: &CommitSha) -> Result<(), BuildError> {
        let workspace = BuildWorkspace::create_in(self.cache.root())
            .await
            .map_err(|e| BuildError::Workspace {
                message: e.to_string(),
            })?;
        debug!(workspace = %workspace.path().display(), "created build workspace");

        let result = self.run_steps(&workspace, sha).await;
        workspace.remove().await;
        result
    }
}
