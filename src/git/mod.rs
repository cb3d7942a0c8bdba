//! Git operations over bare cache repositories and working checkouts.
//!
//! All repository access goes through the system git command via
//! [`GitCommand`]. A [`GitRepo`] wraps one bare clone in the cache and knows
//! how to list tags, resolve references, read blobs at revisions, and
//! materialize working-directory checkouts for the build step.

pub mod command_builder;

pub use command_builder::{GitCommand, GitOutput};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::core::Result;

/// One bare repository in the cache.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Wrap an existing (or about-to-exist) bare repository directory.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The bare repository directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a bare repository exists at this path.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.join("HEAD").is_file()
    }

    /// Clone `url` as a bare repository at `path`.
    pub async fn clone_bare(url: &str, path: impl Into<PathBuf>, context: &str) -> Result<Self> {
        let path = path.into();
        GitCommand::clone_bare(url, &path).with_context(context).execute_success().await?;
        Ok(Self { path })
    }

    /// Fetch branches and tags from the remote.
    pub async fn fetch(&self, url: &str, context: &str) -> Result<()> {
        GitCommand::fetch()
            .current_dir(&self.path)
            .for_repository(url)
            .with_context(context)
            .execute_success()
            .await
    }

    /// Every tag name, deduplicated.
    pub async fn list_tags(&self) -> Result<Vec<String>> {
        let stdout =
            GitCommand::list_tags().current_dir(&self.path).execute_stdout().await?;
        let tags: BTreeSet<String> =
            stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect();
        Ok(tags.into_iter().collect())
    }

    /// Resolve a branch or tag name to a commit hash.
    pub async fn resolve_reference(&self, reference: &str) -> Result<String> {
        GitCommand::resolve_ref(reference)
            .current_dir(&self.path)
            .for_repository(self.path.display().to_string())
            .execute_stdout()
            .await
    }

    /// The contents of `file_path` at `revision`, or `None` when the file
    /// does not exist there.
    ///
    /// Read failures fold into `None`: a revision without the file and a
    /// revision where the file cannot be read both mean "no manifest here".
    pub async fn read_blob(&self, revision: &str, file_path: &str) -> Option<String> {
        GitCommand::read_blob(revision, file_path)
            .current_dir(&self.path)
            .execute()
            .await
            .ok()
            .map(|output| output.stdout)
    }

    /// Materialize `revision` in a working directory.
    ///
    /// Idempotent: when the directory already has the revision checked out
    /// the operation is a no-op. An existing stale checkout is fetched from
    /// the cache repository and moved to the revision; a missing directory
    /// is produced by a local clone first.
    pub async fn checkout_into(
        &self,
        work_dir: &Path,
        revision: &str,
        use_submodules: bool,
        context: &str,
    ) -> Result<()> {
        let commit = self.resolve_reference(revision).await?;

        if work_dir.join(".git").exists() {
            let current = GitCommand::current_commit()
                .current_dir(work_dir)
                .execute_stdout()
                .await
                .unwrap_or_default();
            if current == commit {
                tracing::debug!(target: "git", "({context}) already at {commit}");
                return Ok(());
            }
            GitCommand::fetch()
                .current_dir(work_dir)
                .for_repository(self.path.display().to_string())
                .with_context(context)
                .execute_success()
                .await?;
        } else {
            GitCommand::clone_local(&self.path, work_dir)
                .with_context(context)
                .execute_success()
                .await?;
        }

        GitCommand::checkout(&commit)
            .current_dir(work_dir)
            .for_repository(self.path.display().to_string())
            .with_context(context)
            .execute_success()
            .await?;

        if use_submodules {
            GitCommand::submodule_update()
                .current_dir(work_dir)
                .for_repository(self.path.display().to_string())
                .with_context(context)
                .execute_success()
                .await?;
        }

        Ok(())
    }
}
