//! Bare-clone repository cache with fetch deduplication.
//!
//! Each project occupies one subdirectory of the cache named after the
//! project's short name and holds a bare clone. All VCS operations for a
//! given project are serialized on a per-project lock so concurrent callers
//! never mutate the same clone; fetches against a remote happen at most once
//! per process run, and tag listings are memoized for the same window.
//!
//! The cache implements [`RepositoryGateway`], which is how the resolver
//! reaches repositories without knowing about the filesystem layout.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, broadcast};

use crate::constants::MANIFEST_FILENAME;
use crate::core::Result;
use crate::gateway::RepositoryGateway;
use crate::git::GitRepo;
use crate::manifest::Manifest;
use crate::project::{ProjectEvent, ProjectIdentifier};
use crate::utils::fs::ensure_dir;
use crate::version::PinnedVersion;

#[derive(Default)]
struct CacheState {
    /// Projects fetched (or freshly cloned) during this run.
    fetched: HashSet<ProjectIdentifier>,
    /// Memoized tag listings.
    versions: HashMap<ProjectIdentifier, Vec<PinnedVersion>>,
}

/// The process-wide repository cache.
pub struct ProjectCache {
    dir: PathBuf,
    events: broadcast::Sender<ProjectEvent>,
    state: Mutex<CacheState>,
    /// Per-project operation locks (the repository-operation lane).
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProjectCache {
    /// Create a cache rooted at `dir`, reporting progress on `events`.
    pub fn new(dir: PathBuf, events: broadcast::Sender<ProjectEvent>) -> Self {
        Self {
            dir,
            events,
            state: Mutex::new(CacheState::default()),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// The cache root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The bare-clone directory for a project.
    #[must_use]
    pub fn repository_path(&self, project: &ProjectIdentifier) -> PathBuf {
        self.dir.join(project.name())
    }

    fn emit(&self, event: ProjectEvent) {
        // Dropped when nothing is subscribed; events never block work.
        let _ = self.events.send(event);
    }

    fn lock_for(&self, project: &ProjectIdentifier) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock map is never poisoned");
        locks.entry(project.name().to_string()).or_default().clone()
    }

    /// Ensure a bare clone of `project` exists and is fresh: clone when
    /// absent, fetch otherwise. Fetches are deduplicated per run.
    pub async fn ensure_repository(&self, project: &ProjectIdentifier) -> Result<GitRepo> {
        let url = project.clone_url()?;
        let lock = self.lock_for(project);
        let _guard = lock.lock().await;

        let repo = GitRepo::at(self.repository_path(project));
        let already_fetched =
            self.state.lock().await.fetched.contains(project);

        if !repo.exists() {
            self.emit(ProjectEvent::Cloning(project.clone()));
            ensure_dir(&self.dir)?;
            GitRepo::clone_bare(&url, repo.path(), project.name()).await?;
        } else if !already_fetched {
            self.emit(ProjectEvent::Fetching(project.clone()));
            repo.fetch(&url, project.name()).await?;
        }

        self.state.lock().await.fetched.insert(project.clone());
        Ok(repo)
    }

    /// Check `project` out at `revision` under `work_dir`.
    ///
    /// Idempotent; emits [`ProjectEvent::CheckingOut`] before doing work.
    pub async fn checkout(
        &self,
        project: &ProjectIdentifier,
        revision: &PinnedVersion,
        work_dir: &Path,
        use_submodules: bool,
    ) -> Result<()> {
        let repo = self.ensure_repository(project).await?;
        let lock = self.lock_for(project);
        let _guard = lock.lock().await;

        self.emit(ProjectEvent::CheckingOut(project.clone(), revision.clone()));
        repo.checkout_into(work_dir, revision.as_str(), use_submodules, project.name())
            .await
    }
}

impl RepositoryGateway for ProjectCache {
    async fn versions(&self, project: &ProjectIdentifier) -> Result<Vec<PinnedVersion>> {
        if let Some(memoized) = self.state.lock().await.versions.get(project) {
            return Ok(memoized.clone());
        }
        let repo = self.ensure_repository(project).await?;
        let pins: Vec<PinnedVersion> =
            repo.list_tags().await?.into_iter().map(PinnedVersion::new).collect();
        self.state.lock().await.versions.insert(project.clone(), pins.clone());
        Ok(pins)
    }

    async fn manifest_at(
        &self,
        project: &ProjectIdentifier,
        revision: &PinnedVersion,
    ) -> Result<Option<Manifest>> {
        let repo = self.ensure_repository(project).await?;
        match repo.read_blob(revision.as_str(), MANIFEST_FILENAME).await {
            Some(text) => Ok(Some(Manifest::parse(&text, Some(MANIFEST_FILENAME))?)),
            None => Ok(None),
        }
    }

    async fn resolve_reference(
        &self,
        project: &ProjectIdentifier,
        reference: &str,
    ) -> Result<PinnedVersion> {
        let repo = self.ensure_repository(project).await?;
        repo.resolve_reference(reference).await.map(PinnedVersion::new)
    }
}
