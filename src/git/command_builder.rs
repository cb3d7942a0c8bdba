//! Type-safe git command builder.
//!
//! A fluent API over `tokio::process::Command` for the git invocations the
//! cache and coordinator perform. The working directory is passed with
//! `git -C` so invocations are independent of the process directory. No
//! timeout is imposed by default; callers wrap operations in their own
//! deadlines when they need one.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::{CartelError, Result};
use crate::utils::platform::git_command;

/// Operations whose failures are reported as repository-checkout failures
/// rather than generic shell-task failures.
const CHECKOUT_CLASS_OPS: &[&str] = &["clone", "fetch", "checkout", "rev-parse", "submodule"];

/// Builder for one git invocation.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
    timeout_duration: Option<Duration>,
    /// Remote URL or repository path named in checkout-class errors.
    repository: Option<String>,
    /// Context tag included in debug logs (typically the project name).
    context: Option<String>,
}

/// Captured output of a completed git invocation.
pub struct GitOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl GitCommand {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: None,
            repository: None,
            context: None,
        }
    }

    /// Run the command inside `dir` via `git -C`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the git process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Cap the invocation's runtime.
    pub const fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = Some(duration);
        self
    }

    /// Name the repository for error reporting.
    pub fn for_repository(mut self, url: impl Into<String>) -> Self {
        self.repository = Some(url.into());
        self
    }

    /// Tag log lines with an operation context, typically a project name.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Execute, failing on non-zero exit.
    pub async fn execute(self) -> Result<GitOutput> {
        let mut full_args = Vec::new();
        if let Some(dir) = &self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());

        match &self.context {
            Some(ctx) => tracing::debug!(target: "git", "({ctx}) git {}", full_args.join(" ")),
            None => tracing::debug!(target: "git", "git {}", full_args.join(" ")),
        }

        let mut cmd = Command::new(git_command());
        cmd.args(&full_args);
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let started = std::time::Instant::now();
        let output_future = cmd.output();
        let output = match self.timeout_duration {
            Some(duration) => match timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(self.failure(
                        &full_args,
                        -1,
                        format!("git timed out after {}s", duration.as_secs()),
                    ));
                }
            },
            None => output_future.await,
        }
        .map_err(|e| CartelError::ShellTaskFailed {
            task: format!("git {}", self.operation(&full_args)),
            exit_code: -1,
            stderr: format!("failed to launch git: {e}"),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(self.failure(
                &full_args,
                output.status.code().unwrap_or(-1),
                stderr,
            ));
        }

        let elapsed = started.elapsed();
        if elapsed.as_secs() >= 1 {
            tracing::info!(
                target: "git::perf",
                "git {} took {:.2}s",
                self.operation(&full_args),
                elapsed.as_secs_f64()
            );
        }

        Ok(GitOutput { stdout, stderr })
    }

    /// Execute and return trimmed stdout.
    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.stdout.trim().to_string())
    }

    /// Execute, discarding output.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await.map(|_| ())
    }

    /// The git subcommand, skipping a leading `-C <dir>`.
    fn operation<'x>(&self, full_args: &'x [String]) -> &'x str {
        let skip = if full_args.first().map(String::as_str) == Some("-C") { 2 } else { 0 };
        full_args.get(skip).map_or("unknown", String::as_str)
    }

    fn failure(&self, full_args: &[String], exit_code: i32, stderr: String) -> CartelError {
        let operation = self.operation(full_args);
        if CHECKOUT_CLASS_OPS.contains(&operation) {
            let url = self.repository.clone().unwrap_or_else(|| {
                self.current_dir
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), |d| d.display().to_string())
            });
            CartelError::RepositoryCheckoutFailed { url, reason: stderr }
        } else {
            CartelError::ShellTaskFailed {
                task: format!("git {operation}"),
                exit_code,
                stderr,
            }
        }
    }
}

// Convenience builders for the operations the core names.

impl GitCommand {
    /// `clone --bare <url> <target>` for the repository cache.
    pub fn clone_bare(url: &str, target: impl AsRef<Path>) -> Self {
        Self::new()
            .args(["clone", "--bare", "--quiet", url])
            .args([target.as_ref().display().to_string()])
            .for_repository(url)
    }

    /// `clone <source> <target>`: local clone from the cache into a
    /// working directory.
    pub fn clone_local(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Self {
        let source = source.as_ref().display().to_string();
        Self::new()
            .args(["clone", "--quiet"])
            .args([source.clone(), target.as_ref().display().to_string()])
            .for_repository(source)
    }

    /// `fetch` branches and tags, forced so moved tags converge.
    ///
    /// The refspec is explicit because bare cache clones have no configured
    /// fetch refspec of their own.
    pub fn fetch() -> Self {
        Self::new().args([
            "fetch",
            "--quiet",
            "--force",
            "--prune",
            "--tags",
            "origin",
            "+refs/heads/*:refs/heads/*",
        ])
    }

    /// `tag -l`: list tags.
    pub fn list_tags() -> Self {
        Self::new().args(["tag", "-l"])
    }

    /// `rev-parse --verify <ref>^{commit}`: resolve a reference to a commit.
    pub fn resolve_ref(reference: &str) -> Self {
        Self::new().args(["rev-parse", "--verify", "--quiet", &format!("{reference}^{{commit}}")])
    }

    /// `show <revision>:<path>`: read a blob at a revision.
    pub fn read_blob(revision: &str, path: &str) -> Self {
        Self::new().args(["show", &format!("{revision}:{path}")])
    }

    /// `checkout --force <revision>` in a working directory.
    pub fn checkout(revision: &str) -> Self {
        Self::new().args(["checkout", "--quiet", "--force", revision])
    }

    /// `rev-parse HEAD`: current commit of a working directory.
    pub fn current_commit() -> Self {
        Self::new().args(["rev-parse", "HEAD"])
    }

    /// `submodule update --init --recursive`.
    pub fn submodule_update() -> Self {
        Self::new().args(["submodule", "update", "--init", "--recursive", "--quiet"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn version_query_succeeds() {
        let out = GitCommand::new().args(["--version"]).execute_stdout().await.unwrap();
        assert!(out.contains("git version"), "{out}");
    }

    #[tokio::test]
    async fn checkout_class_failures_name_the_repository() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitCommand::fetch()
            .current_dir(dir.path())
            .for_repository("https://example.invalid/repo.git")
            .execute_success()
            .await
            .unwrap_err();
        let CartelError::RepositoryCheckoutFailed { url, .. } = err else {
            panic!("expected checkout failure, got {err}")
        };
        assert_eq!(url, "https://example.invalid/repo.git");
    }

    #[tokio::test]
    async fn other_failures_are_shell_task_failures() {
        let err = GitCommand::new()
            .args(["definitely-not-a-subcommand"])
            .execute_success()
            .await
            .unwrap_err();
        assert!(matches!(err, CartelError::ShellTaskFailed { .. }));
    }
}
