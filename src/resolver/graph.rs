//! The dependency graph built up during resolution.
//!
//! One node per project, edges from dependents to their dependencies, and a
//! root set for the projects named by the top-level manifest. Attaching a
//! node for a project that is already present unifies the two requirements
//! instead of inserting a second node; the failure modes of that unification
//! are the resolver's two recoverable errors.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::core::{CartelError, Result};
use crate::project::{Dependency, ProjectIdentifier};
use crate::version::PinnedVersion;

use super::types::DependencyNode;

/// Acyclic multimap of projects, requirement intersections, and edges.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<ProjectIdentifier, DependencyNode>,
    /// Project → set of the projects it depends on.
    edges: HashMap<ProjectIdentifier, BTreeSet<ProjectIdentifier>>,
    roots: BTreeSet<ProjectIdentifier>,
    /// Discovery order, for deterministic iteration.
    order: Vec<ProjectIdentifier>,
}

impl DependencyGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `node`, unifying requirements if the project is already
    /// present, and record the edge from `parent` (or mark a root).
    ///
    /// Returns the node now stored for the project and whether its
    /// dependencies still need to be walked: true when the node is new or
    /// its specifier was tightened by the merge. An unchanged merge means
    /// the subtree below it is already consistent with the stored state.
    pub fn add_node(
        &mut self,
        node: DependencyNode,
        parent: Option<&ProjectIdentifier>,
    ) -> Result<(DependencyNode, bool)> {
        let project = node.project.clone();

        let walk_children = match self.nodes.get_mut(&project) {
            Some(existing) => {
                let merged = existing
                    .current_specifier
                    .intersection(&node.current_specifier)
                    .ok_or_else(|| CartelError::IncompatibleRequirements {
                        project: project.clone(),
                        first: existing.current_specifier.clone(),
                        second: node.current_specifier.clone(),
                    })?;
                if merged == existing.current_specifier {
                    false
                } else {
                    // The tightened requirement must still admit the version
                    // already proposed; otherwise the enclosing frame has to
                    // try a different candidate tuple.
                    if !merged.satisfies(&existing.pinned_version()) {
                        return Err(CartelError::RequiredVersionNotFound {
                            project: project.clone(),
                            specifier: merged,
                        });
                    }
                    existing.current_specifier = merged;
                    true
                }
            }
            None => {
                self.nodes.insert(project.clone(), node);
                self.order.push(project.clone());
                true
            }
        };

        match parent {
            Some(parent) => {
                debug_assert!(self.nodes.contains_key(parent), "edge from unknown parent");
                self.edges.entry(parent.clone()).or_default().insert(project.clone());
            }
            None => {
                self.roots.insert(project.clone());
            }
        }

        let stored = self.nodes.get(&project).expect("node was just stored").clone();
        Ok((stored, walk_children))
    }

    /// The node stored for `project`, if any.
    #[must_use]
    pub fn node(&self, project: &ProjectIdentifier) -> Option<&DependencyNode> {
        self.nodes.get(project)
    }

    /// Projects listed by the top-level manifest.
    #[must_use]
    pub const fn roots(&self) -> &BTreeSet<ProjectIdentifier> {
        &self.roots
    }

    /// Number of projects in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn dependencies_of(&self, project: &ProjectIdentifier) -> Option<&BTreeSet<ProjectIdentifier>> {
        self.edges.get(project)
    }

    /// Fail if the graph contains a dependency cycle.
    fn check_acyclic(&self) -> Result<()> {
        let mut graph = DiGraph::<&ProjectIdentifier, ()>::new();
        let mut indices = HashMap::new();
        for project in &self.order {
            indices.insert(project, graph.add_node(project));
        }
        for (parent, children) in &self.edges {
            for child in children {
                graph.add_edge(indices[parent], indices[child], ());
            }
        }
        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            CartelError::InvalidArgument {
                description: format!(
                    "circular dependency involving {}",
                    graph[cycle.node_id()]
                ),
            }
        })
    }

    /// The resolved dependencies in build order: every node precedes every
    /// node that depends on it.
    ///
    /// Ordering is a stable sort over discovery order; a node whose
    /// dependencies include the other sorts after it, ties broken by
    /// ascending direct-dependency count, then ascending project name.
    pub fn ordered_dependencies(&self) -> Result<Vec<Dependency<PinnedVersion>>> {
        self.check_acyclic()?;

        let empty = BTreeSet::new();
        let mut projects = self.order.clone();
        projects.sort_by(|a, b| {
            let a_deps = self.dependencies_of(a).unwrap_or(&empty);
            let b_deps = self.dependencies_of(b).unwrap_or(&empty);
            if b_deps.contains(a) {
                std::cmp::Ordering::Less
            } else if a_deps.contains(b) {
                std::cmp::Ordering::Greater
            } else {
                a_deps
                    .len()
                    .cmp(&b_deps.len())
                    .then_with(|| a.name().cmp(b.name()))
                    .then_with(|| a.cmp(b))
            }
        });

        Ok(projects
            .into_iter()
            .map(|project| {
                let node = &self.nodes[&project];
                Dependency::new(project.clone(), node.pinned_version())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{SemanticVersion, VersionSpecifier};

    fn project(name: &str) -> ProjectIdentifier {
        ProjectIdentifier::github("o", name)
    }

    fn node(name: &str, version: &str, spec: VersionSpecifier) -> DependencyNode {
        let pin = PinnedVersion::new(format!("v{version}"));
        DependencyNode::new(
            project(name),
            SemanticVersion::from_pinned(&pin).unwrap(),
            spec,
        )
    }

    fn ver(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn inserting_marks_roots_and_edges() {
        let mut graph = DependencyGraph::new();
        let (_, walk) = graph.add_node(node("a", "1.0.0", VersionSpecifier::Any), None).unwrap();
        assert!(walk);
        let parent = project("a");
        graph
            .add_node(node("b", "2.0.0", VersionSpecifier::Any), Some(&parent))
            .unwrap();
        assert!(graph.roots().contains(&project("a")));
        assert!(!graph.roots().contains(&project("b")));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn merging_tightens_the_specifier() {
        let mut graph = DependencyGraph::new();
        graph
            .add_node(node("a", "1.3.0", VersionSpecifier::CompatibleWith(ver("1.0.0"))), None)
            .unwrap();
        let (merged, walk) = graph
            .add_node(node("a", "1.0.2", VersionSpecifier::AtLeast(ver("1.2.0"))), None)
            .unwrap();
        assert!(walk);
        // The stored proposal survives; the incoming one is discarded.
        assert_eq!(merged.proposed_version, ver("1.3.0"));
        assert_eq!(
            merged.current_specifier,
            VersionSpecifier::CompatibleWith(ver("1.2.0"))
        );
    }

    #[test]
    fn unchanged_merge_skips_the_child_walk() {
        let mut graph = DependencyGraph::new();
        let spec = VersionSpecifier::CompatibleWith(ver("1.0.0"));
        graph.add_node(node("a", "1.3.0", spec.clone()), None).unwrap();
        let (_, walk) = graph.add_node(node("a", "1.0.2", spec), None).unwrap();
        assert!(!walk);
    }

    #[test]
    fn empty_intersection_is_incompatible_requirements() {
        let mut graph = DependencyGraph::new();
        graph
            .add_node(node("a", "1.3.0", VersionSpecifier::CompatibleWith(ver("1.0.0"))), None)
            .unwrap();
        let err = graph
            .add_node(node("a", "2.0.0", VersionSpecifier::CompatibleWith(ver("2.0.0"))), None)
            .unwrap_err();
        assert_eq!(
            err,
            CartelError::IncompatibleRequirements {
                project: project("a"),
                first: VersionSpecifier::CompatibleWith(ver("1.0.0")),
                second: VersionSpecifier::CompatibleWith(ver("2.0.0")),
            }
        );
    }

    #[test]
    fn tightened_specifier_must_admit_the_stored_proposal() {
        let mut graph = DependencyGraph::new();
        graph
            .add_node(node("a", "1.0.2", VersionSpecifier::CompatibleWith(ver("1.0.0"))), None)
            .unwrap();
        let err = graph
            .add_node(node("a", "1.3.0", VersionSpecifier::AtLeast(ver("1.2.0"))), None)
            .unwrap_err();
        assert_eq!(
            err,
            CartelError::RequiredVersionNotFound {
                project: project("a"),
                specifier: VersionSpecifier::CompatibleWith(ver("1.2.0")),
            }
        );
    }

    #[test]
    fn equal_git_references_merge_without_a_version_check() {
        let mut graph = DependencyGraph::new();
        let pin = PinnedVersion::new("8ff4393");
        let spec = VersionSpecifier::GitReference("development".into());
        graph
            .add_node(
                DependencyNode::new(
                    project("a"),
                    SemanticVersion::unknown(pin),
                    spec.clone(),
                ),
                None,
            )
            .unwrap();
        let (_, walk) = graph
            .add_node(
                DependencyNode::new(
                    project("a"),
                    SemanticVersion::unknown(PinnedVersion::new("8ff4393")),
                    spec,
                ),
                None,
            )
            .unwrap();
        assert!(!walk);
    }

    #[test]
    fn ordering_puts_dependencies_first() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("app", "1.0.0", VersionSpecifier::Any), None).unwrap();
        let app = project("app");
        graph.add_node(node("net", "2.0.0", VersionSpecifier::Any), Some(&app)).unwrap();
        let net = project("net");
        graph.add_node(node("sock", "1.1.0", VersionSpecifier::Any), Some(&net)).unwrap();

        let ordered = graph.ordered_dependencies().unwrap();
        let names: Vec<&str> = ordered.iter().map(|d| d.project.name()).collect();
        let pos = |n| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("sock") < pos("net"));
        assert!(pos("net") < pos("app"));
    }

    #[test]
    fn independent_projects_tie_break_by_name() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("B", "1.0.0", VersionSpecifier::Any), None).unwrap();
        graph.add_node(node("A", "1.0.0", VersionSpecifier::Any), None).unwrap();
        let ordered = graph.ordered_dependencies().unwrap();
        let names: Vec<&str> = ordered.iter().map(|d| d.project.name()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn fewer_dependencies_sort_first() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("many", "1.0.0", VersionSpecifier::Any), None).unwrap();
        graph.add_node(node("zero", "1.0.0", VersionSpecifier::Any), None).unwrap();
        let many = project("many");
        graph.add_node(node("x", "1.0.0", VersionSpecifier::Any), Some(&many)).unwrap();
        graph.add_node(node("y", "1.0.0", VersionSpecifier::Any), Some(&many)).unwrap();

        let ordered = graph.ordered_dependencies().unwrap();
        let names: Vec<&str> = ordered.iter().map(|d| d.project.name()).collect();
        let pos = |n| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("zero") < pos("many"));
        assert!(pos("x") < pos("many"));
        assert!(pos("y") < pos("many"));
    }

    #[test]
    fn cycles_are_reported() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("a", "1.0.0", VersionSpecifier::Any), None).unwrap();
        let a = project("a");
        graph.add_node(node("b", "1.0.0", VersionSpecifier::Any), Some(&a)).unwrap();
        let b = project("b");
        graph.add_node(node("a", "1.0.0", VersionSpecifier::Any), Some(&b)).unwrap();
        let err = graph.ordered_dependencies().unwrap_err();
        assert!(matches!(err, CartelError::InvalidArgument { .. }));
    }

    #[test]
    fn pins_come_from_the_proposing_tag() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("a", "1.3.0", VersionSpecifier::Any), None).unwrap();
        let ordered = graph.ordered_dependencies().unwrap();
        assert_eq!(ordered[0].version, PinnedVersion::new("v1.3.0"));
    }
}
