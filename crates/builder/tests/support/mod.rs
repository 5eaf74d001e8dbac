//! A scripted `CommandRunner` that records what the pipeline asked for.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use builder::{CommandFailure, CommandLine, CommandRunner};

/// One recorded command invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub dir: PathBuf,
    /// Names of the entries in `dir` when the command started.
    pub entries: Vec<String>,
}

/// Pretends to run commands. The build command writes `<dir>/build/index.html`,
/// or only creates `<dir>/build/` after [`ScriptedRunner::build_nothing`].
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    build_command: String,
    fail_on: Mutex<Option<String>>,
    invocations: Mutex<Vec<Invocation>>,
    builds: AtomicUsize,
    empty_output: AtomicBool,
}

impl ScriptedRunner {
    pub fn new(build_command: &str) -> Self {
        Self {
            build_command: build_command.to_owned(),
            ..Self::default()
        }
    }

    /// Makes every command whose text starts with `prefix` exit with status 1.
    pub fn fail_on(&self, prefix: &str) {
        *self.fail_on.lock().unwrap() = Some(prefix.to_owned());
    }

    /// Makes the build command leave its output directory empty.
    pub fn build_nothing(&self) {
        self.empty_output.store(true, Ordering::SeqCst);
    }

    pub fn succeed(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.command).collect()
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn exit_status_one() -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(1 << 8)
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, dir: &Path, command: &CommandLine) -> Result<(), CommandFailure> {
        let text = command.to_string();
        self.invocations.lock().unwrap().push(Invocation {
            command: text.clone(),
            dir: dir.to_path_buf(),
            entries: entries(dir),
        });

        let failing = self
            .fail_on
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|prefix| text.starts_with(prefix));
        if failing {
            return Err(CommandFailure::Exit(exit_status_one()));
        }

        if text == self.build_command {
            self.builds.fetch_add(1, Ordering::SeqCst);
            let out = dir.join("build");
            std::fs::create_dir_all(&out)?;
            if !self.empty_output.load(Ordering::SeqCst) {
                std::fs::write(out.join("index.html"), b"<html></html>")?;
            }
        }
        Ok(())
    }
}

/// Lists the entries of `root`, sorted.
pub fn root_entries(root: &Path) -> Vec<String> {
    entries(root)
}
