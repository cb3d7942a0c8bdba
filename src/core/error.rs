//! Error handling for Cartel.
//!
//! The error system distinguishes ten kinds. Two of them,
//! [`CartelError::IncompatibleRequirements`] and
//! [`CartelError::RequiredVersionNotFound`], are recoverable inside the
//! resolver: they make the enclosing search frame try its next candidate
//! tuple. Every other kind propagates immediately to the caller.
//!
//! Each kind carries a stable numeric code (see [`CartelError::code`]) used
//! when errors are serialized or scripted against; the CLI itself always
//! exits 1 on failure and prints a one-line summary.

use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;

use crate::project::ProjectIdentifier;
use crate::version::VersionSpecifier;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CartelError>;

/// The error type for all Cartel operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartelError {
    /// An external process exited non-zero.
    ///
    /// `task` names the abstract operation (e.g. `git fetch`,
    /// `xcodebuild build-scheme`); `stderr` is the captured error output.
    #[error("task '{task}' exited with code {exit_code}: {stderr}")]
    ShellTaskFailed {
        /// Abstract operation name plus the program invoked.
        task: String,
        /// Exit code reported by the process (-1 if terminated by signal).
        exit_code: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Caller-side misuse: an argument or on-disk state that can never work.
    #[error("invalid argument: {description}")]
    InvalidArgument {
        /// What was wrong.
        description: String,
    },

    /// A build setting expected in xcodebuild output was absent.
    #[error("missing build setting '{key}'")]
    MissingBuildSetting {
        /// The setting key, e.g. `PLATFORM_NAME`.
        key: String,
    },

    /// An I/O read failed.
    #[error("failed to read {}: {reason}", path.display())]
    ReadFailed {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O description.
        reason: String,
    },

    /// Two requirements on the same project have an empty intersection.
    ///
    /// Recoverable during resolution: the enclosing frame tries the next
    /// candidate tuple before surfacing this.
    #[error("incompatible requirements for {project}: {first} and {second}")]
    IncompatibleRequirements {
        /// The project both requirements apply to.
        project: ProjectIdentifier,
        /// Requirement already recorded in the graph.
        first: VersionSpecifier,
        /// Incoming requirement that failed to unify.
        second: VersionSpecifier,
    },

    /// No known version of a project satisfies a specifier.
    ///
    /// Recoverable during resolution, like
    /// [`IncompatibleRequirements`](Self::IncompatibleRequirements).
    #[error("no available version of {project} satisfies {specifier}")]
    RequiredVersionNotFound {
        /// The project with no admissible version.
        project: ProjectIdentifier,
        /// The unified specifier that nothing satisfies.
        specifier: VersionSpecifier,
    },

    /// A clone, fetch, reference resolution, or checkout failed.
    #[error("failed to check out repository {url}: {reason}")]
    RepositoryCheckoutFailed {
        /// Remote URL or cache path of the repository.
        url: String,
        /// VCS or filesystem failure description.
        reason: String,
    },

    /// An I/O write failed.
    #[error("failed to write {}: {reason}", path.display())]
    WriteFailed {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying I/O description.
        reason: String,
    },

    /// A manifest, lockfile, or tool output was malformed.
    #[error("parse error: {description}")]
    ParseError {
        /// What failed to parse, including a filename hint when available.
        description: String,
    },

    /// The same project appears more than once in the combined manifests.
    #[error("duplicate dependencies: {}", format_projects(projects))]
    DuplicateDependencies {
        /// Every project that appeared more than once.
        projects: Vec<ProjectIdentifier>,
    },
}

fn format_projects(projects: &[ProjectIdentifier]) -> String {
    projects.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl CartelError {
    /// Stable numeric code for serialized errors.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::ShellTaskFailed { .. } => 1,
            Self::InvalidArgument { .. } => 2,
            Self::MissingBuildSetting { .. } => 3,
            Self::ReadFailed { .. } => 4,
            Self::IncompatibleRequirements { .. } => 5,
            Self::RequiredVersionNotFound { .. } => 6,
            Self::RepositoryCheckoutFailed { .. } => 7,
            Self::WriteFailed { .. } => 8,
            Self::ParseError { .. } => 9,
            Self::DuplicateDependencies { .. } => 10,
        }
    }

    /// Whether the resolver may catch this error and try another candidate.
    #[must_use]
    pub const fn is_resolver_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IncompatibleRequirements { .. } | Self::RequiredVersionNotFound { .. }
        )
    }

    /// Build a [`ReadFailed`](Self::ReadFailed) from an I/O error.
    pub fn read(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Build a [`WriteFailed`](Self::WriteFailed) from an I/O error.
    pub fn write(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Build a [`ParseError`](Self::ParseError) with an optional filename hint.
    pub fn parse(description: impl Into<String>, filename: Option<&str>) -> Self {
        let description = description.into();
        Self::ParseError {
            description: match filename {
                Some(name) => format!("{name}: {description}"),
                None => description,
            },
        }
    }

    /// Print the one-line colored summary the CLI shows on failure.
    ///
    /// Shell-task failures additionally print the tail of the captured
    /// stderr, since that is usually the only actionable detail.
    pub fn display(&self) {
        eprintln!("{} {self}", "error:".red().bold());
        if let Self::ShellTaskFailed { stderr, .. } = self {
            for line in stderr.lines().rev().take(10).collect::<Vec<_>>().into_iter().rev() {
                eprintln!("  {}", line.dimmed());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SemanticVersion;

    fn project(name: &str) -> ProjectIdentifier {
        ProjectIdentifier::github("owner", name)
    }

    #[test]
    fn codes_are_stable() {
        let v = SemanticVersion::parse("1.0.0").unwrap();
        let cases: Vec<(CartelError, u8)> = vec![
            (
                CartelError::ShellTaskFailed {
                    task: "git fetch".into(),
                    exit_code: 128,
                    stderr: String::new(),
                },
                1,
            ),
            (CartelError::InvalidArgument { description: "bad".into() }, 2),
            (CartelError::MissingBuildSetting { key: "PLATFORM_NAME".into() }, 3),
            (CartelError::ReadFailed { path: "/x".into(), reason: "gone".into() }, 4),
            (
                CartelError::IncompatibleRequirements {
                    project: project("a"),
                    first: VersionSpecifier::Exactly(v.clone()),
                    second: VersionSpecifier::AtLeast(v.clone()),
                },
                5,
            ),
            (
                CartelError::RequiredVersionNotFound {
                    project: project("a"),
                    specifier: VersionSpecifier::Any,
                },
                6,
            ),
            (
                CartelError::RepositoryCheckoutFailed {
                    url: "https://example.com/r.git".into(),
                    reason: "no ref".into(),
                },
                7,
            ),
            (CartelError::WriteFailed { path: "/x".into(), reason: "denied".into() }, 8),
            (CartelError::ParseError { description: "line 3".into() }, 9),
            (CartelError::DuplicateDependencies { projects: vec![project("a")] }, 10),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn only_resolver_kinds_are_recoverable() {
        let v = SemanticVersion::parse("2.0.0").unwrap();
        assert!(
            CartelError::IncompatibleRequirements {
                project: project("a"),
                first: VersionSpecifier::CompatibleWith(v.clone()),
                second: VersionSpecifier::Exactly(v.clone()),
            }
            .is_resolver_recoverable()
        );
        assert!(
            CartelError::RequiredVersionNotFound {
                project: project("a"),
                specifier: VersionSpecifier::AtLeast(v),
            }
            .is_resolver_recoverable()
        );
        assert!(
            !CartelError::ParseError { description: "x".into() }.is_resolver_recoverable()
        );
        assert!(
            !CartelError::RepositoryCheckoutFailed { url: "u".into(), reason: "r".into() }
                .is_resolver_recoverable()
        );
    }

    #[test]
    fn parse_error_includes_filename_hint() {
        let err = CartelError::parse("unexpected token", Some("Cartelfile"));
        assert_eq!(err.to_string(), "parse error: Cartelfile: unexpected token");
    }
}
