//! Version model: pinned revisions, semantic versions, and specifiers.
//!
//! A [`PinnedVersion`] is an opaque immutable revision reference (tag name or
//! commit hash). A [`SemanticVersion`] is the ordered `(major, minor, patch)`
//! triple parsed from a pin, keeping a back-reference to the pin it came
//! from. [`VersionSpecifier`] expresses constraints over pins and supports
//! partial intersection; see [`specifier`].

pub mod specifier;

pub use specifier::VersionSpecifier;

use std::fmt;

use crate::core::{CartelError, Result};

/// An opaque string referring to an immutable repository revision.
///
/// Equality is plain string equality; no normalization is applied, so
/// `v1.0.0` and `1.0.0` are distinct pins even though they parse to the same
/// semantic version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinnedVersion(String);

impl PinnedVersion {
    /// Wrap a tag name or commit hash.
    pub fn new(revision: impl Into<String>) -> Self {
        Self(revision.into())
    }

    /// The raw revision string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PinnedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PinnedVersion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A `(major, minor, patch)` triple with an optional back-reference to the
/// pin it was parsed from.
///
/// Ordering and equality consider only the triple; the pin back-reference is
/// bookkeeping so the resolver can recover the exact tag that produced a
/// candidate. A sentinel "unknown" version (see [`SemanticVersion::unknown`])
/// stands in for revisions pinned by a named git reference, where no triple
/// exists.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    version: semver::Version,
    pinned: Option<PinnedVersion>,
    unknown: bool,
}

impl SemanticVersion {
    /// Parse a version string.
    ///
    /// Accepts an optional leading non-numeric prefix (commonly `v`), then
    /// `a[.b[.c]]` where missing minor/patch default to 0. Any pre-release or
    /// build-metadata suffix is rejected: only plain release triples identify
    /// releasable revisions.
    pub fn parse(s: &str) -> Result<Self> {
        let digits_start = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| CartelError::parse(format!("no version number in '{s}'"), None))?;
        let numeric = &s[digits_start..];

        let mut components = [0u64; 3];
        let mut count = 0;
        for part in numeric.split('.') {
            if count == 3 {
                return Err(CartelError::parse(
                    format!("too many version components in '{s}'"),
                    None,
                ));
            }
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CartelError::parse(
                    format!("invalid version component '{part}' in '{s}'"),
                    None,
                ));
            }
            components[count] = part
                .parse::<u64>()
                .map_err(|e| CartelError::parse(format!("version '{s}': {e}"), None))?;
            count += 1;
        }

        Ok(Self {
            version: semver::Version::new(components[0], components[1], components[2]),
            pinned: None,
            unknown: false,
        })
    }

    /// Parse a pin as a semantic version, recording the back-reference.
    ///
    /// Returns `None` when the pin does not parse; such pins may be branch
    /// names or bare commit hashes and are handled separately.
    #[must_use]
    pub fn from_pinned(pin: &PinnedVersion) -> Option<Self> {
        Self::parse(pin.as_str()).ok().map(|v| v.with_pin(pin.clone()))
    }

    /// The sentinel version for a revision pinned by a named git reference.
    ///
    /// Compares below every parsed version so ref-pinned candidates never
    /// outrank tagged releases.
    #[must_use]
    pub fn unknown(pin: PinnedVersion) -> Self {
        Self {
            version: semver::Version::new(0, 0, 0),
            pinned: Some(pin),
            unknown: true,
        }
    }

    fn with_pin(mut self, pin: PinnedVersion) -> Self {
        self.pinned = Some(pin);
        self
    }

    /// Major component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.version.major
    }

    /// Minor component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.version.minor
    }

    /// Patch component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.version.patch
    }

    /// The pin this version was parsed from, if any.
    #[must_use]
    pub const fn pin(&self) -> Option<&PinnedVersion> {
        self.pinned.as_ref()
    }

    /// The pin to record in a lockfile for this version.
    ///
    /// Falls back to the rendered triple when the version was constructed
    /// directly rather than parsed from a pin.
    #[must_use]
    pub fn pinned_version(&self) -> PinnedVersion {
        self.pinned.clone().unwrap_or_else(|| PinnedVersion::new(self.to_string()))
    }

    /// Whether this is the sentinel for a ref-pinned revision.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.unknown
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.version.cmp(&other.version)
    }
}

impl std::hash::Hash for SemanticVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

// Sentinel versions display the original pin so error messages and logs name
// the ref the user wrote, not "0.0.0".
impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unknown {
            match &self.pinned {
                Some(pin) => write!(f, "{pin}"),
                None => write!(f, "(unknown)"),
            }
        } else {
            write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
        }
    }
}
