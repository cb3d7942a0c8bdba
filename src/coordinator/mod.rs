//! Clone → resolve → lock → checkout sequencing.
//!
//! The coordinator owns the repository cache, locates and parses the root
//! manifests, drives the resolver through the cache's gateway
//! implementation, writes the lockfile, and checks every resolved dependency
//! out into its working directory in build order. Progress events flow out
//! on a hot broadcast channel that UI layers may subscribe to at any time;
//! with no subscriber attached events are dropped.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;

use crate::cache::ProjectCache;
use crate::constants::{
    CHECKOUTS_SUBDIR, LOCKFILE_FILENAME, MANIFEST_FILENAME, OUTPUT_DIR,
    PRIVATE_MANIFEST_FILENAME,
};
use crate::core::{CartelError, Result};
use crate::lockfile::Lockfile;
use crate::manifest::Manifest;
use crate::project::{ProjectEvent, ProjectIdentifier};
use crate::resolver::Resolver;
use crate::utils::platform::ensure_git_available;
use crate::version::PinnedVersion;
use crate::xcode::{BuildOptions, build_working_directory};

/// Capacity of the event channel; events beyond an unread backlog are
/// dropped rather than ever blocking the pipeline.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Drives the top-level pipeline for one root project.
pub struct ProjectCoordinator {
    root_dir: PathBuf,
    cache: ProjectCache,
    events: broadcast::Sender<ProjectEvent>,
    use_submodules: bool,
}

impl ProjectCoordinator {
    /// Create a coordinator for the project at `root_dir`, caching
    /// repositories under `cache_dir`.
    pub fn new(root_dir: PathBuf, cache_dir: PathBuf, use_submodules: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            cache: ProjectCache::new(cache_dir, events.clone()),
            root_dir,
            events,
            use_submodules,
        }
    }

    /// Subscribe to progress events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.events.subscribe()
    }

    /// The root project directory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Path of the root manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root_dir.join(MANIFEST_FILENAME)
    }

    /// Path of the lockfile.
    #[must_use]
    pub fn lockfile_path(&self) -> PathBuf {
        self.root_dir.join(LOCKFILE_FILENAME)
    }

    /// The working directory a dependency is checked out into.
    #[must_use]
    pub fn working_directory(&self, project: &ProjectIdentifier) -> PathBuf {
        self.root_dir.join(OUTPUT_DIR).join(CHECKOUTS_SUBDIR).join(project.name())
    }

    /// Load the root manifest, combined with the private manifest when one
    /// exists. The combined set must have no duplicate projects.
    pub fn load_manifest(&self) -> Result<Manifest> {
        let path = self.manifest_path();
        let text = std::fs::read_to_string(&path).map_err(|e| CartelError::read(&path, &e))?;
        let manifest = Manifest::parse(&text, Some(MANIFEST_FILENAME))?;

        let private_path = self.root_dir.join(PRIVATE_MANIFEST_FILENAME);
        match std::fs::read_to_string(&private_path) {
            Ok(text) => {
                let private = Manifest::parse(&text, Some(PRIVATE_MANIFEST_FILENAME))?;
                manifest.combining(&private)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(manifest),
            Err(e) => Err(CartelError::read(&private_path, &e)),
        }
    }

    /// Load the lockfile, or `None` when the project has never resolved.
    pub fn load_lockfile(&self) -> Result<Option<Lockfile>> {
        Lockfile::load(&self.lockfile_path())
    }

    /// Resolve the manifests and write a fresh lockfile atomically.
    pub async fn update_lockfile(&self) -> Result<Lockfile> {
        ensure_git_available()?;
        let manifest = self.load_manifest()?;
        let resolver = Resolver::new(&self.cache);
        let dependencies = resolver.resolve(&manifest).await?;
        let lockfile = Lockfile { dependencies };
        lockfile.write(&self.lockfile_path())?;
        tracing::info!(
            target: "coordinator",
            "wrote {} with {} entries",
            LOCKFILE_FILENAME,
            lockfile.dependencies.len()
        );
        Ok(lockfile)
    }

    /// The lockfile if present, otherwise the result of a fresh update.
    pub async fn load_or_update_lockfile(&self) -> Result<Lockfile> {
        match self.load_lockfile()? {
            Some(lockfile) => Ok(lockfile),
            None => self.update_lockfile().await,
        }
    }

    /// Check every resolved dependency out at its pinned revision, in build
    /// order. Checkouts are idempotent.
    pub async fn checkout_dependencies(&self, lockfile: &Lockfile) -> Result<()> {
        ensure_git_available()?;
        for dependency in &lockfile.dependencies {
            self.checkout(&dependency.project, &dependency.version).await?;
        }
        Ok(())
    }

    async fn checkout(
        &self,
        project: &ProjectIdentifier,
        revision: &PinnedVersion,
    ) -> Result<()> {
        let work_dir = self.working_directory(project);
        self.cache.checkout(project, revision, &work_dir, self.use_submodules).await
    }

    /// Build every dependency serially in lockfile order, so each
    /// dependency's products are present before its dependents build.
    pub async fn build_dependencies(
        &self,
        lockfile: &Lockfile,
        options: &BuildOptions,
        log: &mut dyn FnMut(&str),
    ) -> Result<()> {
        for dependency in &lockfile.dependencies {
            let work_dir = self.working_directory(&dependency.project);
            tracing::info!(
                target: "coordinator",
                "building {} at {}",
                dependency.project,
                dependency.version
            );
            build_working_directory(&self.root_dir, &work_dir, options, log).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .env("GIT_AUTHOR_NAME", "test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .expect("git is available");
        assert!(status.success());
    }

    fn upstream_repo(root: &Path, name: &str, tags: &[&str]) -> PathBuf {
        let repo = root.join(name);
        std::fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "--quiet", "--initial-branch", "main"]);
        for (index, tag) in tags.iter().enumerate() {
            std::fs::write(repo.join("VERSION"), tag).unwrap();
            git(&repo, &["add", "."]);
            git(&repo, &["commit", "--quiet", "-m", &format!("release {index}")]);
            git(&repo, &["tag", tag]);
        }
        repo
    }

    fn coordinator(temp: &Path) -> ProjectCoordinator {
        let root = temp.join("root");
        std::fs::create_dir_all(&root).unwrap();
        ProjectCoordinator::new(root, temp.join("cache"), false)
    }

    #[tokio::test]
    async fn update_resolves_checks_out_and_writes_the_lockfile() {
        let temp = tempfile::tempdir().unwrap();
        let upstream = upstream_repo(temp.path(), "Widget", &["1.0.0", "1.2.0", "2.0.0"]);
        let coordinator = coordinator(temp.path());

        std::fs::write(
            coordinator.manifest_path(),
            format!("git \"{}\" ~> 1.0\n", upstream.display()),
        )
        .unwrap();

        let lockfile = coordinator.update_lockfile().await.unwrap();
        assert_eq!(lockfile.dependencies.len(), 1);
        assert_eq!(lockfile.dependencies[0].version, PinnedVersion::new("1.2.0"));
        assert!(coordinator.lockfile_path().is_file());

        coordinator.checkout_dependencies(&lockfile).await.unwrap();
        let checkout =
            coordinator.working_directory(&lockfile.dependencies[0].project);
        assert_eq!(std::fs::read_to_string(checkout.join("VERSION")).unwrap(), "1.2.0");

        // Re-running converges without error.
        coordinator.checkout_dependencies(&lockfile).await.unwrap();
    }

    #[tokio::test]
    async fn private_manifest_merges_and_duplicates_fail() {
        let temp = tempfile::tempdir().unwrap();
        let coordinator = coordinator(temp.path());
        std::fs::write(coordinator.manifest_path(), "github \"O/A\" ~> 1.0\n").unwrap();
        std::fs::write(
            coordinator.root_dir().join(PRIVATE_MANIFEST_FILENAME),
            "github \"O/B\"\n",
        )
        .unwrap();
        assert_eq!(coordinator.load_manifest().unwrap().dependencies.len(), 2);

        std::fs::write(
            coordinator.root_dir().join(PRIVATE_MANIFEST_FILENAME),
            "github \"O/A\"\n",
        )
        .unwrap();
        assert!(matches!(
            coordinator.load_manifest().unwrap_err(),
            CartelError::DuplicateDependencies { .. }
        ));
    }

    #[tokio::test]
    async fn missing_manifest_is_a_read_failure() {
        let temp = tempfile::tempdir().unwrap();
        let coordinator = coordinator(temp.path());
        assert!(matches!(
            coordinator.load_manifest().unwrap_err(),
            CartelError::ReadFailed { .. }
        ));
    }

    #[tokio::test]
    async fn load_or_update_falls_back_to_resolution() {
        let temp = tempfile::tempdir().unwrap();
        let upstream = upstream_repo(temp.path(), "Widget", &["1.0.0"]);
        let coordinator = coordinator(temp.path());
        std::fs::write(
            coordinator.manifest_path(),
            format!("git \"{}\"\n", upstream.display()),
        )
        .unwrap();

        let lockfile = coordinator.load_or_update_lockfile().await.unwrap();
        assert_eq!(lockfile.dependencies[0].version, PinnedVersion::new("1.0.0"));

        // A second call reads the file instead of resolving again.
        let reloaded = coordinator.load_or_update_lockfile().await.unwrap();
        assert_eq!(reloaded, lockfile);
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let temp = tempfile::tempdir().unwrap();
        let upstream = upstream_repo(temp.path(), "Widget", &["1.0.0"]);
        let coordinator = coordinator(temp.path());
        std::fs::write(
            coordinator.manifest_path(),
            format!("git \"{}\"\n", upstream.display()),
        )
        .unwrap();

        let mut events = coordinator.subscribe();
        let lockfile = coordinator.update_lockfile().await.unwrap();
        coordinator.checkout_dependencies(&lockfile).await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(match event {
                ProjectEvent::Cloning(_) => "clone",
                ProjectEvent::Fetching(_) => "fetch",
                ProjectEvent::CheckingOut(_, _) => "checkout",
            });
        }
        assert!(kinds.contains(&"clone"));
        assert!(kinds.contains(&"checkout"));
        // Within a project, cloning precedes checking out.
        assert!(
            kinds.iter().position(|k| *k == "clone")
                < kinds.iter().position(|k| *k == "checkout")
        );
    }
}
