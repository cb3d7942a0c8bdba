//! The repository interface consumed by the resolver.
//!
//! The resolver discovers the dependency graph lazily: version information
//! for a project only exists after its repository has been cloned or fetched
//! and its tags listed, and a project's manifest is read from a blob at a
//! specific revision. [`RepositoryGateway`] abstracts that discovery so the
//! resolver can be exercised against an in-memory fixture in tests and
//! against the bare-clone cache in production.

use crate::core::Result;
use crate::manifest::Manifest;
use crate::project::ProjectIdentifier;
use crate::version::PinnedVersion;

/// Supplies versions, manifests-at-revision, and reference resolution.
///
/// Implementations may memoize `versions` per project for the lifetime of
/// the process, and must deduplicate fetches against a given remote within
/// the process run.
pub trait RepositoryGateway {
    /// Every known releasable revision of `project` (its tags).
    ///
    /// Order is irrelevant; duplicates must not occur.
    fn versions(
        &self,
        project: &ProjectIdentifier,
    ) -> impl Future<Output = Result<Vec<PinnedVersion>>>;

    /// The manifest of `project` at `revision`, or `None` when the project
    /// has no manifest at that revision.
    fn manifest_at(
        &self,
        project: &ProjectIdentifier,
        revision: &PinnedVersion,
    ) -> impl Future<Output = Result<Option<Manifest>>>;

    /// Resolve a named branch or tag to a commit pin.
    ///
    /// Fails with [`crate::core::CartelError::RepositoryCheckoutFailed`]
    /// when the reference does not exist.
    fn resolve_reference(
        &self,
        project: &ProjectIdentifier,
        reference: &str,
    ) -> impl Future<Output = Result<PinnedVersion>>;
}
