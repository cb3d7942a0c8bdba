//! `Cartelfile` parsing and emission.
//!
//! The manifest is line-oriented UTF-8 text. Lines whose first non-blank
//! character is `#` are comments, a trailing `#…` outside quotes is a
//! trailing comment, and blank lines are ignored. Every remaining line is
//! one dependency:
//!
//! ```text
//! github "Alamofire/Alamofire" ~> 5.0
//! github "https://git.corp.example/team/Networking"
//! git "https://example.com/tools/Build.git" >= 1.2
//! git "file:///tmp/repo" "development"
//! binary "https://example.com/specs/Analytics.json" == 2.1
//! ```
//!
//! Parsing then emission is idempotent modulo comments, whitespace, and
//! ordering: emission is deterministic, sorted by project name ascending,
//! one dependency per line, trailing newline.

pub mod scanner;

pub use scanner::{Token, Tokenizer};

use std::collections::HashSet;

use crate::core::{CartelError, Result};
use crate::project::{Dependency, ProjectIdentifier};
use crate::version::{SemanticVersion, VersionSpecifier};

/// The parsed dependency set of a `Cartelfile`.
///
/// Conceptually an unordered set keyed by project; declaration order is kept
/// so resolver candidates are tried in the order the user wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// Dependencies in declaration order. No project appears twice.
    pub dependencies: Vec<Dependency<VersionSpecifier>>,
}

impl Manifest {
    /// Parse manifest text. `filename` is only used in error messages.
    pub fn parse(text: &str, filename: Option<&str>) -> Result<Self> {
        let mut dependencies = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let stripped = scanner::strip_comment(line);
            let trimmed = stripped.trim();
            if trimmed.is_empty() {
                continue;
            }
            let dependency = parse_dependency_line(trimmed).map_err(|e| {
                annotate_line(e, filename, index + 1)
            })?;
            dependencies.push(dependency);
        }
        let manifest = Self { dependencies };
        manifest.check_duplicates()?;
        Ok(manifest)
    }

    /// Render the manifest in canonical form.
    #[must_use]
    pub fn emit(&self) -> String {
        let mut sorted: Vec<&Dependency<VersionSpecifier>> = self.dependencies.iter().collect();
        sorted.sort_by(|a, b| {
            a.project.name().cmp(b.project.name()).then_with(|| a.project.cmp(&b.project))
        });
        let mut out = String::new();
        for dep in sorted {
            out.push_str(dep.project.source_kind());
            out.push_str(&format!(" \"{}\"", dep.project.locator()));
            match &dep.version {
                VersionSpecifier::Any => {}
                spec => out.push_str(&format!(" {spec}")),
            }
            out.push('\n');
        }
        out
    }

    /// Merge this manifest with a companion private manifest.
    ///
    /// The combined set must still have no duplicate projects.
    pub fn combining(&self, private: &Self) -> Result<Self> {
        let combined = Self {
            dependencies: self
                .dependencies
                .iter()
                .chain(private.dependencies.iter())
                .cloned()
                .collect(),
        };
        combined.check_duplicates()?;
        Ok(combined)
    }

    /// Whether the manifest lists no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    fn check_duplicates(&self) -> Result<()> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for dep in &self.dependencies {
            if !seen.insert(&dep.project) && !duplicates.contains(&dep.project) {
                duplicates.push(dep.project.clone());
            }
        }
        if duplicates.is_empty() {
            Ok(())
        } else {
            duplicates.sort();
            Err(CartelError::DuplicateDependencies { projects: duplicates })
        }
    }
}

fn annotate_line(err: CartelError, filename: Option<&str>, line: usize) -> CartelError {
    match err {
        CartelError::ParseError { description } => {
            CartelError::parse(format!("line {line}: {description}"), filename)
        }
        other => other,
    }
}

/// Parse one `<source-kind> "<locator>" [<specifier>]` line.
pub(crate) fn parse_dependency_line(line: &str) -> Result<Dependency<VersionSpecifier>> {
    let mut tokens = Tokenizer::new(line);

    let kind = match tokens.next()? {
        Some(Token::Word(word)) => word,
        other => {
            return Err(CartelError::parse(
                format!("expected a source kind, got {}", describe(other.as_ref())),
                None,
            ));
        }
    };

    let locator = match tokens.next()? {
        Some(Token::Quoted(s)) => s,
        other => {
            return Err(CartelError::parse(
                format!("expected a quoted locator, got {}", describe(other.as_ref())),
                None,
            ));
        }
    };

    let project = match kind.as_str() {
        "github" => ProjectIdentifier::parse_github(&locator)?,
        "git" => ProjectIdentifier::Git(locator),
        "binary" => ProjectIdentifier::Binary(locator),
        other => {
            return Err(CartelError::parse(format!("unknown source kind '{other}'"), None));
        }
    };

    let version = parse_specifier(&mut tokens)?;

    if let Some(extra) = tokens.next()? {
        return Err(CartelError::parse(
            format!("unexpected trailing {}", describe(Some(&extra))),
            None,
        ));
    }

    Ok(Dependency::new(project, version))
}

/// Parse an optional version specifier from the remaining tokens.
pub(crate) fn parse_specifier(tokens: &mut Tokenizer<'_>) -> Result<VersionSpecifier> {
    match tokens.next()? {
        None => Ok(VersionSpecifier::Any),
        Some(Token::Quoted(reference)) => Ok(VersionSpecifier::GitReference(reference)),
        Some(Token::Operator(op)) => {
            let version = match tokens.next()? {
                Some(Token::Word(word)) => SemanticVersion::parse(&word)?,
                other => {
                    return Err(CartelError::parse(
                        format!("expected a version after '{op}', got {}", describe(other.as_ref())),
                        None,
                    ));
                }
            };
            Ok(match op.as_str() {
                "==" => VersionSpecifier::Exactly(version),
                ">=" => VersionSpecifier::AtLeast(version),
                "~>" => VersionSpecifier::CompatibleWith(version),
                // The tokenizer only emits the three operators above.
                _ => unreachable!("unhandled operator {op}"),
            })
        }
        Some(token) => Err(CartelError::parse(
            format!("expected a version specifier, got {}", describe(Some(&token))),
            None,
        )),
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of line".to_string(),
        Some(Token::Word(w)) => format!("'{w}'"),
        Some(Token::Quoted(q)) => format!("\"{q}\""),
        Some(Token::Operator(op)) => format!("'{op}'"),
    }
}
