//! Working records used during resolution.

use std::cmp::Ordering;
use std::fmt;

use crate::project::ProjectIdentifier;
use crate::version::{PinnedVersion, SemanticVersion, VersionSpecifier};

/// One project under consideration, with the version currently proposed for
/// it and the unified specifier of every requirement placed on it so far.
///
/// Identity is the project alone: two nodes for the same project are the
/// same node regardless of version, which is what lets the graph merge
/// overlapping requirements onto a single record.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// The project this node stands for.
    pub project: ProjectIdentifier,
    /// The version currently proposed for the project.
    pub proposed_version: SemanticVersion,
    /// Intersection of all requirements that have reached this project.
    pub current_specifier: VersionSpecifier,
}

impl DependencyNode {
    /// Create a node proposing `version` under `specifier`.
    pub const fn new(
        project: ProjectIdentifier,
        proposed_version: SemanticVersion,
        current_specifier: VersionSpecifier,
    ) -> Self {
        Self { project, proposed_version, current_specifier }
    }

    /// The pin to record for this node's proposed version.
    #[must_use]
    pub fn pinned_version(&self) -> PinnedVersion {
        self.proposed_version.pinned_version()
    }
}

impl PartialEq for DependencyNode {
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project
    }
}

impl Eq for DependencyNode {}

impl std::hash::Hash for DependencyNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.project.hash(state);
    }
}

// Candidates sort by proposed version descending so the search tries the
// highest admissible version at every choice point.
impl PartialOrd for DependencyNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DependencyNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other.proposed_version.cmp(&self.proposed_version)
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.project, self.proposed_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, version: &str) -> DependencyNode {
        DependencyNode::new(
            ProjectIdentifier::github("o", name),
            SemanticVersion::parse(version).unwrap(),
            VersionSpecifier::Any,
        )
    }

    #[test]
    fn identity_is_the_project() {
        assert_eq!(node("a", "1.0.0"), node("a", "2.0.0"));
        assert_ne!(node("a", "1.0.0"), node("b", "1.0.0"));
    }

    #[test]
    fn ordering_prefers_higher_versions() {
        let mut nodes = vec![node("a", "1.0.0"), node("a", "2.1.0"), node("a", "0.9.0")];
        nodes.sort();
        let versions: Vec<String> =
            nodes.iter().map(|n| n.proposed_version.to_string()).collect();
        assert_eq!(versions, ["2.1.0", "1.0.0", "0.9.0"]);
    }
}
