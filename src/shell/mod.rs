//! Generic subprocess runner for external tools.
//!
//! Git has its own specialized builder in [`crate::git`]; this module covers
//! everything else the core shells out to (`xcodebuild`, `xcrun`). Commands
//! are named by abstract operation so failures report what was being
//! attempted rather than a raw argv. Stdout can be captured whole or
//! streamed line-by-line while stderr is drained into a bounded buffer.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::core::{CartelError, Result};

/// Maximum bytes of stderr retained for error reporting.
const STDERR_BUFFER_LIMIT: usize = 64 * 1024;

/// Builder for one external tool invocation.
pub struct ShellCommand {
    task: String,
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: Vec<(String, String)>,
}

/// Captured output of a completed invocation.
#[derive(Debug)]
pub struct ShellOutput {
    /// Full standard output (empty when streamed).
    pub stdout: String,
    /// Trimmed tail of standard error.
    pub stderr: String,
}

impl ShellCommand {
    /// Create a command. `task` is the abstract operation name used in
    /// error messages and logs (e.g. `list-schemes`).
    pub fn new(task: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    fn log_invocation(&self) {
        tracing::debug!(
            target: "shell",
            "({}) {} {}",
            self.task,
            self.program,
            self.args.join(" ")
        );
    }

    /// Run to completion, capturing stdout and stderr.
    pub async fn execute(self) -> Result<ShellOutput> {
        self.log_invocation();
        let output = self.build().output().await.map_err(|e| CartelError::ShellTaskFailed {
            task: self.task.clone(),
            exit_code: -1,
            stderr: format!("failed to launch {}: {e}", self.program),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = truncate_tail(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(ShellOutput { stdout, stderr })
        } else {
            Err(CartelError::ShellTaskFailed {
                task: self.task,
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            })
        }
    }

    /// Run to completion, invoking `on_line` for each stdout line as it
    /// arrives while stderr drains into a bounded buffer.
    pub async fn stream_stdout<F>(self, mut on_line: F) -> Result<ShellOutput>
    where
        F: FnMut(&str),
    {
        self.log_invocation();
        let mut child = self.build().spawn().map_err(|e| CartelError::ShellTaskFailed {
            task: self.task.clone(),
            exit_code: -1,
            stderr: format!("failed to launch {}: {e}", self.program),
        })?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let mut stderr = child.stderr.take().expect("stderr was piped");

        let stderr_task = async {
            let mut buffer = Vec::new();
            let _ = stderr.read_to_end(&mut buffer).await;
            String::from_utf8_lossy(&buffer).to_string()
        };

        let stdout_task = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                on_line(&line);
            }
        };

        let (stderr_text, ()) = tokio::join!(stderr_task, stdout_task);
        let status = child.wait().await.map_err(|e| CartelError::ShellTaskFailed {
            task: self.task.clone(),
            exit_code: -1,
            stderr: e.to_string(),
        })?;

        let stderr = truncate_tail(&stderr_text);
        if status.success() {
            Ok(ShellOutput { stdout: String::new(), stderr })
        } else {
            Err(CartelError::ShellTaskFailed {
                task: self.task,
                exit_code: status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

fn truncate_tail(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_BUFFER_LIMIT {
        return trimmed.to_string();
    }
    let start = trimmed.len() - STDERR_BUFFER_LIMIT;
    // Keep the tail; the end of a build log is where the failure is.
    let boundary = trimmed
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= start)
        .unwrap_or(start);
    trimmed[boundary..].to_string()
}
