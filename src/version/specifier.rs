//! Version specifiers and constraint intersection.
//!
//! A [`VersionSpecifier`] is one requirement placed on a project by a
//! manifest. Specifiers support a partial intersection operator used by the
//! resolver to unify the requirements reaching a project from different
//! dependents; an empty intersection means the requirements can never be
//! satisfied together.

use std::fmt;

use super::{PinnedVersion, SemanticVersion};

/// A requirement over the versions of a single project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSpecifier {
    /// Any version at all.
    Any,
    /// Any version at or above the given one.
    AtLeast(SemanticVersion),
    /// Same major version and at or above the given one (`~>`).
    CompatibleWith(SemanticVersion),
    /// Exactly the given version.
    Exactly(SemanticVersion),
    /// A named branch, tag, or commit; matched by string equality.
    GitReference(String),
}

impl VersionSpecifier {
    /// Whether `pin` satisfies this specifier.
    ///
    /// Semantic variants parse the pin as a semantic version and apply their
    /// predicate. A pin that does not parse satisfies every semantic variant:
    /// unknown ref names may be branches, and rejecting them would make a
    /// branch checkout unable to meet any requirement. This is deliberately
    /// permissive (a branch tip named `my-feature` matches `~> 2.0`).
    #[must_use]
    pub fn satisfies(&self, pin: &PinnedVersion) -> bool {
        let version = SemanticVersion::from_pinned(pin);
        match self {
            Self::Any => true,
            Self::GitReference(name) => pin.as_str() == name,
            Self::AtLeast(required) => {
                version.as_ref().is_none_or(|v| v >= required)
            }
            Self::CompatibleWith(required) => version.as_ref().is_none_or(|v| {
                // Any 0.x.y release may break the exported API, so zero-major
                // versions are only compatible within the same minor.
                if v.major() == 0 {
                    v.minor() == required.minor() && v >= required
                } else {
                    v.major() == required.major() && v >= required
                }
            }),
            Self::Exactly(required) => version.as_ref().is_none_or(|v| v == required),
        }
    }

    /// Intersect two specifiers, returning `None` when they are incompatible.
    ///
    /// The operator is commutative and associative. `GitReference` only
    /// intersects with itself (same ref) or `Any`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        use VersionSpecifier::{Any, AtLeast, CompatibleWith, Exactly, GitReference};

        match (self, other) {
            (Any, x) | (x, Any) => Some(x.clone()),

            (GitReference(a), GitReference(b)) => {
                (a == b).then(|| GitReference(a.clone()))
            }
            // Named refs cannot be reconciled with semver requirements.
            (GitReference(_), _) | (_, GitReference(_)) => None,

            (AtLeast(a), AtLeast(b)) => Some(AtLeast(a.max(b).clone())),

            (CompatibleWith(a), CompatibleWith(b)) => {
                (a.major() == b.major()).then(|| CompatibleWith(a.max(b).clone()))
            }

            (AtLeast(a), CompatibleWith(c)) | (CompatibleWith(c), AtLeast(a)) => {
                if a.major() > c.major() {
                    None
                } else if a.major() < c.major() {
                    Some(CompatibleWith(c.clone()))
                } else {
                    Some(CompatibleWith(a.max(c).clone()))
                }
            }

            (Exactly(e), x) | (x, Exactly(e)) => {
                x.satisfies(&e.pinned_version()).then(|| Exactly(e.clone()))
            }
        }
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "(any)"),
            Self::AtLeast(v) => write!(f, ">= {v}"),
            Self::CompatibleWith(v) => write!(f, "~> {v}"),
            Self::Exactly(v) => write!(f, "== {v}"),
            Self::GitReference(name) => write!(f, "\"{name}\""),
        }
    }
}
