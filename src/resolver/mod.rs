//! Backtracking version resolution over a lazily discovered graph.
//!
//! Given a top-level manifest, [`Resolver::resolve`] produces the pinned
//! dependencies of the whole transitive graph in build order. The search is
//! depth-first over the Cartesian product of per-project candidate lists,
//! layered by manifest discovery: every candidate tuple that attaches
//! cleanly to the graph recurses into the manifests of its members, and the
//! first fully consistent assignment wins.
//!
//! Candidates are ordered highest-first, so the answer prefers the highest
//! admissible version at every choice point. The two recoverable errors,
//! incompatible requirements and no-version-found, make a frame advance to
//! its next tuple; everything else (I/O, VCS failures) aborts the search
//! immediately.

pub mod graph;
pub mod types;

pub use graph::DependencyGraph;
pub use types::DependencyNode;

use futures::future::LocalBoxFuture;

use crate::core::{CartelError, Result};
use crate::gateway::RepositoryGateway;
use crate::manifest::Manifest;
use crate::project::{Dependency, ProjectIdentifier};
use crate::version::{PinnedVersion, SemanticVersion, VersionSpecifier};

/// The backtracking solver. Cheap to construct; all state lives in the
/// per-attempt graphs.
pub struct Resolver<'a, G> {
    gateway: &'a G,
}

impl<'a, G: RepositoryGateway> Resolver<'a, G> {
    /// Create a resolver over `gateway`.
    pub const fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Resolve `manifest` to pinned dependencies in build order.
    ///
    /// The produced set has exactly one entry per project reachable from the
    /// root, and every pin satisfies every specifier placed on its project
    /// by any manifest in the reachable set.
    pub async fn resolve(
        &self,
        manifest: &Manifest,
    ) -> Result<Vec<Dependency<PinnedVersion>>> {
        if manifest.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(
            target: "resolver",
            "resolving {} root dependencies",
            manifest.dependencies.len()
        );
        let lists = self.candidate_lists(&manifest.dependencies).await?;
        let graph = self.permute(DependencyGraph::new(), None, lists).await?;
        tracing::debug!(target: "resolver", "resolved {} projects", graph.node_count());
        graph.ordered_dependencies()
    }

    /// Build the candidate list for every dependency, in declaration order.
    async fn candidate_lists(
        &self,
        dependencies: &[Dependency<VersionSpecifier>],
    ) -> Result<Vec<Vec<DependencyNode>>> {
        let mut lists = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            lists.push(self.candidates(dependency).await?);
        }
        Ok(lists)
    }

    /// Enumerate admissible candidates for one dependency, highest first.
    async fn candidates(
        &self,
        dependency: &Dependency<VersionSpecifier>,
    ) -> Result<Vec<DependencyNode>> {
        if let VersionSpecifier::GitReference(reference) = &dependency.version {
            let pin =
                self.gateway.resolve_reference(&dependency.project, reference).await?;
            return Ok(vec![DependencyNode::new(
                dependency.project.clone(),
                SemanticVersion::unknown(pin),
                dependency.version.clone(),
            )]);
        }

        let mut candidates: Vec<DependencyNode> = self
            .gateway
            .versions(&dependency.project)
            .await?
            .into_iter()
            .filter_map(|pin| SemanticVersion::from_pinned(&pin))
            .filter(|version| dependency.version.satisfies(&version.pinned_version()))
            .map(|version| {
                DependencyNode::new(
                    dependency.project.clone(),
                    version,
                    dependency.version.clone(),
                )
            })
            .collect();

        if candidates.is_empty() {
            return Err(CartelError::RequiredVersionNotFound {
                project: dependency.project.clone(),
                specifier: dependency.version.clone(),
            });
        }
        candidates.sort();
        Ok(candidates)
    }

    /// Try every tuple of the candidate lists against `base`, returning the
    /// first graph in which the whole subtree attaches.
    ///
    /// When every tuple fails, the last recoverable error propagates up one
    /// frame, where an outer permutation may still succeed.
    fn permute<'s>(
        &'s self,
        base: DependencyGraph,
        parent: Option<ProjectIdentifier>,
        lists: Vec<Vec<DependencyNode>>,
    ) -> LocalBoxFuture<'s, Result<DependencyGraph>> {
        Box::pin(async move {
            if lists.is_empty() {
                return Ok(base);
            }
            let mut last_error = None;
            for tuple in Permutations::new(&lists) {
                match self.attach_tuple(base.clone(), parent.as_ref(), tuple).await {
                    Ok(graph) => return Ok(graph),
                    Err(e) if e.is_resolver_recoverable() => {
                        tracing::trace!(target: "resolver", "candidate rejected: {e}");
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(last_error.expect("non-empty candidate lists yield at least one tuple"))
        })
    }

    /// Attach every node of one tuple, then walk the dependencies of each
    /// node that is new or whose requirement was tightened.
    async fn attach_tuple(
        &self,
        mut graph: DependencyGraph,
        parent: Option<&ProjectIdentifier>,
        tuple: Vec<DependencyNode>,
    ) -> Result<DependencyGraph> {
        let mut pending = Vec::new();
        for node in tuple {
            let (stored, walk_children) = graph.add_node(node, parent)?;
            if walk_children {
                pending.push(stored);
            }
        }
        for node in pending {
            graph = self.resolve_children(graph, node).await?;
        }
        Ok(graph)
    }

    /// Recurse into a node's manifest at its pinned revision.
    fn resolve_children<'s>(
        &'s self,
        graph: DependencyGraph,
        node: DependencyNode,
    ) -> LocalBoxFuture<'s, Result<DependencyGraph>> {
        Box::pin(async move {
            let manifest = self
                .gateway
                .manifest_at(&node.project, &node.pinned_version())
                .await?
                .unwrap_or_default();
            if manifest.is_empty() {
                return Ok(graph);
            }
            let lists = self.candidate_lists(&manifest.dependencies).await?;
            self.permute(graph, Some(node.project), lists).await
        })
    }
}

/// Lazy odometer over the Cartesian product of candidate lists.
///
/// The first tuple pairs the highest candidate of every list in declaration
/// order; subsequent tuples advance the rightmost list first, so earlier
/// declarations hold their preferred versions longest.
struct Permutations<'a> {
    lists: &'a [Vec<DependencyNode>],
    indices: Vec<usize>,
    exhausted: bool,
}

impl<'a> Permutations<'a> {
    fn new(lists: &'a [Vec<DependencyNode>]) -> Self {
        Self {
            lists,
            indices: vec![0; lists.len()],
            exhausted: lists.iter().any(Vec::is_empty),
        }
    }
}

impl Iterator for Permutations<'_> {
    type Item = Vec<DependencyNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let tuple = self
            .indices
            .iter()
            .zip(self.lists)
            .map(|(&i, list)| list[i].clone())
            .collect();

        // Advance the odometer, rightmost digit first.
        self.exhausted = true;
        for position in (0..self.indices.len()).rev() {
            if self.indices[position] + 1 < self.lists[position].len() {
                self.indices[position] += 1;
                self.exhausted = false;
                break;
            }
            self.indices[position] = 0;
        }

        Some(tuple)
    }
}
