//! Project identities, dependencies, and progress events.
//!
//! A [`ProjectIdentifier`] names the source of a dependency: a hosted
//! repository pair (optionally on an enterprise host), a bare git URL, or a
//! binary-framework manifest URL. Identity is structural; the canonical
//! short [`name`](ProjectIdentifier::name) is what filesystem paths and
//! ordering tie-breaks use.

use std::fmt;

use crate::core::{CartelError, Result};

/// The source of a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectIdentifier {
    /// A repository on github.com or a GitHub Enterprise host.
    GitHub {
        /// Base URL of the enterprise host; `None` means github.com.
        host: Option<String>,
        /// Repository owner (user or organization).
        owner: String,
        /// Repository short name.
        name: String,
    },
    /// An arbitrary git remote URL.
    Git(String),
    /// A URL to a binary-framework version manifest.
    Binary(String),
}

impl ProjectIdentifier {
    /// A github.com repository.
    pub fn github(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::GitHub {
            host: None,
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// A repository on a GitHub Enterprise host.
    pub fn github_enterprise(
        host: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::GitHub {
            host: Some(host.into()),
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a `github` locator: either `owner/name` or an
    /// `https://host/owner/name[.git]` enterprise URL.
    pub fn parse_github(locator: &str) -> Result<Self> {
        if locator.starts_with("https://") || locator.starts_with("http://") {
            let trimmed = locator.trim_end_matches('/');
            let rest = trimmed
                .split_once("://")
                .map(|(_, r)| r)
                .unwrap_or(trimmed);
            let mut segments = rest.split('/');
            let host_part = segments.next().unwrap_or_default();
            let path: Vec<&str> = segments.collect();
            let &[owner, name] = path.as_slice() else {
                return Err(CartelError::parse(
                    format!("expected https://host/owner/name, got '{locator}'"),
                    None,
                ));
            };
            let name = name.strip_suffix(".git").unwrap_or(name);
            if owner.is_empty() || name.is_empty() {
                return Err(CartelError::parse(
                    format!("empty owner or name in '{locator}'"),
                    None,
                ));
            }
            let scheme = trimmed.split_once("://").map_or("https", |(s, _)| s);
            let host = format!("{scheme}://{host_part}");
            if host == "https://github.com" {
                Ok(Self::github(owner, name))
            } else {
                Ok(Self::github_enterprise(host, owner, name))
            }
        } else {
            let Some((owner, name)) = locator.split_once('/') else {
                return Err(CartelError::parse(
                    format!("expected owner/name, got '{locator}'"),
                    None,
                ));
            };
            if owner.is_empty() || name.is_empty() || name.contains('/') {
                return Err(CartelError::parse(
                    format!("expected owner/name, got '{locator}'"),
                    None,
                ));
            }
            Ok(Self::github(owner, name))
        }
    }

    /// The canonical short name, used for cache and checkout directory names
    /// and as the final ordering tie-break.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::GitHub { name, .. } => name,
            Self::Git(url) | Self::Binary(url) => {
                let trimmed = url.trim_end_matches('/');
                let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
                last.strip_suffix(".git").unwrap_or(last)
            }
        }
    }

    /// The URL to clone this project's repository from.
    ///
    /// Binary projects have no repository; resolving one is caller misuse
    /// since prebuilt-artifact download is handled outside the core.
    pub fn clone_url(&self) -> Result<String> {
        match self {
            Self::GitHub { host, owner, name } => {
                let base = host.as_deref().unwrap_or("https://github.com");
                Ok(format!("{base}/{owner}/{name}.git"))
            }
            Self::Git(url) => Ok(url.clone()),
            Self::Binary(url) => Err(CartelError::InvalidArgument {
                description: format!(
                    "binary dependency '{url}' has no repository to clone"
                ),
            }),
        }
    }

    /// The manifest source-kind keyword for this identifier.
    #[must_use]
    pub const fn source_kind(&self) -> &'static str {
        match self {
            Self::GitHub { .. } => "github",
            Self::Git(_) => "git",
            Self::Binary(_) => "binary",
        }
    }

    /// The locator string as it appears quoted in a manifest.
    #[must_use]
    pub fn locator(&self) -> String {
        match self {
            Self::GitHub { host: None, owner, name } => format!("{owner}/{name}"),
            Self::GitHub { host: Some(host), owner, name } => {
                format!("{host}/{owner}/{name}")
            }
            Self::Git(url) | Self::Binary(url) => url.clone(),
        }
    }
}

impl fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locator())
    }
}

/// A project paired with a version value.
///
/// `V` is a [`crate::version::VersionSpecifier`] in manifests, a
/// [`crate::version::PinnedVersion`] in lockfiles, and a
/// [`crate::version::SemanticVersion`] inside the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency<V> {
    /// Where the dependency comes from.
    pub project: ProjectIdentifier,
    /// The version value attached to it.
    pub version: V,
}

impl<V> Dependency<V> {
    /// Pair a project with a version value.
    pub const fn new(project: ProjectIdentifier, version: V) -> Self {
        Self { project, version }
    }
}

impl<V: fmt::Display> fmt::Display for Dependency<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.project, self.version)
    }
}

/// Progress events surfaced to UI layers over a broadcast channel.
///
/// Consumed by the CLI for TTY reporting; the core never blocks on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    /// A repository is being cloned into the cache.
    Cloning(ProjectIdentifier),
    /// An existing cached repository is being fetched.
    Fetching(ProjectIdentifier),
    /// A working directory is being checked out at a revision.
    CheckingOut(ProjectIdentifier, crate::version::PinnedVersion),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_name_pair() {
        let id = ProjectIdentifier::parse_github("Alamofire/Alamofire").unwrap();
        assert_eq!(id, ProjectIdentifier::github("Alamofire", "Alamofire"));
        assert_eq!(id.name(), "Alamofire");
        assert_eq!(
            id.clone_url().unwrap(),
            "https://github.com/Alamofire/Alamofire.git"
        );
    }

    #[test]
    fn parses_enterprise_url() {
        let id =
            ProjectIdentifier::parse_github("https://git.corp.example/team/Networking.git")
                .unwrap();
        assert_eq!(
            id,
            ProjectIdentifier::github_enterprise(
                "https://git.corp.example",
                "team",
                "Networking"
            )
        );
        assert_eq!(
            id.clone_url().unwrap(),
            "https://git.corp.example/team/Networking.git"
        );
    }

    #[test]
    fn dotcom_url_normalizes_to_plain_pair() {
        let id = ProjectIdentifier::parse_github("https://github.com/A/B").unwrap();
        assert_eq!(id, ProjectIdentifier::github("A", "B"));
    }

    #[test]
    fn rejects_malformed_locators() {
        assert!(ProjectIdentifier::parse_github("justaname").is_err());
        assert!(ProjectIdentifier::parse_github("a/b/c").is_err());
        assert!(ProjectIdentifier::parse_github("/name").is_err());
        assert!(ProjectIdentifier::parse_github("https://host/only-owner").is_err());
    }

    #[test]
    fn git_url_name_strips_suffix() {
        let id = ProjectIdentifier::Git("https://example.com/repos/Tool.git".into());
        assert_eq!(id.name(), "Tool");
        let id = ProjectIdentifier::Git("file:///tmp/repo".into());
        assert_eq!(id.name(), "repo");
    }

    #[test]
    fn identifiers_are_equal_iff_fields_match() {
        assert_ne!(
            ProjectIdentifier::github("a", "x"),
            ProjectIdentifier::github("b", "x")
        );
        assert_ne!(
            ProjectIdentifier::github("a", "x"),
            ProjectIdentifier::Git("https://github.com/a/x.git".into())
        );
    }

    #[test]
    fn binary_projects_cannot_be_cloned() {
        let id = ProjectIdentifier::Binary("https://example.com/spec.json".into());
        assert!(id.clone_url().is_err());
        assert_eq!(id.source_kind(), "binary");
    }
}
