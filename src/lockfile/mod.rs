//! `Cartelfile.resolved` parsing and atomic emission.
//!
//! The lockfile uses the manifest grammar with the specifier slot always a
//! quoted pin, and is parsed until end of input: any whitespace may separate
//! entries. Emission is canonical (sorted by project name ascending, one
//! entry per line, trailing newline) and writes are atomic so a partial
//! lockfile can never be observed.

use std::path::Path;

use crate::core::{CartelError, Result};
use crate::manifest::{Token, Tokenizer};
use crate::project::{Dependency, ProjectIdentifier};
use crate::utils::fs::atomic_write;
use crate::version::PinnedVersion;

/// The exact pinned revision chosen for every project in the resolved graph.
///
/// Entries are kept in build order (dependencies before dependents) as
/// produced by the resolver; emission re-sorts by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lockfile {
    /// Resolved dependencies in build order.
    pub dependencies: Vec<Dependency<PinnedVersion>>,
}

impl Lockfile {
    /// Parse lockfile text. `filename` is only used in error messages.
    pub fn parse(text: &str, filename: Option<&str>) -> Result<Self> {
        // Comments follow the manifest rules; strip them per line, then
        // tokenize the remainder as one stream.
        let stripped: String = text
            .lines()
            .map(crate::manifest::scanner::strip_comment)
            .collect::<Vec<_>>()
            .join("\n");

        let mut tokens = Tokenizer::new(&stripped);
        let mut dependencies = Vec::new();
        loop {
            let kind = match tokens.next().map_err(|e| hint(e, filename))? {
                None => break,
                Some(Token::Word(word)) => word,
                Some(other) => {
                    return Err(CartelError::parse(
                        format!("expected a source kind, got {other:?}"),
                        filename,
                    ));
                }
            };
            let locator = expect_quoted(&mut tokens, "locator", filename)?;
            let pin = expect_quoted(&mut tokens, "pinned version", filename)?;

            let project = match kind.as_str() {
                "github" => ProjectIdentifier::parse_github(&locator)
                    .map_err(|e| hint(e, filename))?,
                "git" => ProjectIdentifier::Git(locator),
                "binary" => ProjectIdentifier::Binary(locator),
                other => {
                    return Err(CartelError::parse(
                        format!("unknown source kind '{other}'"),
                        filename,
                    ));
                }
            };
            dependencies.push(Dependency::new(project, PinnedVersion::new(pin)));
        }
        Ok(Self { dependencies })
    }

    /// Read and parse a lockfile from disk. `Ok(None)` when the file does
    /// not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let filename = path.file_name().and_then(|n| n.to_str());
                Ok(Some(Self::parse(&text, filename)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CartelError::read(path, &e)),
        }
    }

    /// Render the lockfile in canonical form.
    #[must_use]
    pub fn emit(&self) -> String {
        let mut sorted: Vec<&Dependency<PinnedVersion>> = self.dependencies.iter().collect();
        sorted.sort_by(|a, b| {
            a.project.name().cmp(b.project.name()).then_with(|| a.project.cmp(&b.project))
        });
        let mut out = String::new();
        for dep in sorted {
            out.push_str(&format!(
                "{} \"{}\" \"{}\"\n",
                dep.project.source_kind(),
                dep.project.locator(),
                dep.version
            ));
        }
        out
    }

    /// Write the canonical form atomically (write-then-rename).
    pub fn write(&self, path: &Path) -> Result<()> {
        atomic_write(path, self.emit().as_bytes())
    }

    /// Look up the pin recorded for a project.
    #[must_use]
    pub fn pin_for(&self, project: &ProjectIdentifier) -> Option<&PinnedVersion> {
        self.dependencies.iter().find(|d| &d.project == project).map(|d| &d.version)
    }
}

fn expect_quoted(
    tokens: &mut Tokenizer<'_>,
    what: &str,
    filename: Option<&str>,
) -> Result<String> {
    match tokens.next().map_err(|e| hint(e, filename))? {
        Some(Token::Quoted(s)) => Ok(s),
        other => Err(CartelError::parse(
            format!("expected a quoted {what}, got {other:?}"),
            filename,
        )),
    }
}

fn hint(err: CartelError, filename: Option<&str>) -> CartelError {
    match err {
        CartelError::ParseError { description } => CartelError::parse(description, filename),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(kind: &str, locator: &str, pin: &str) -> Dependency<PinnedVersion> {
        let project = match kind {
            "github" => ProjectIdentifier::parse_github(locator).unwrap(),
            "git" => ProjectIdentifier::Git(locator.to_string()),
            _ => ProjectIdentifier::Binary(locator.to_string()),
        };
        Dependency::new(project, PinnedVersion::new(pin))
    }

    #[test]
    fn parses_line_separated_entries() {
        let lock = Lockfile::parse(
            "github \"A/A\" \"1.3.0\"\ngit \"file:///tmp/repo\" \"8ff4393\"\n",
            None,
        )
        .unwrap();
        assert_eq!(
            lock.dependencies,
            vec![dep("github", "A/A", "1.3.0"), dep("git", "file:///tmp/repo", "8ff4393")]
        );
    }

    #[test]
    fn any_whitespace_separates_entries() {
        let lock = Lockfile::parse(
            "github \"A/A\" \"1.3.0\" github \"B/B\"\n\n\t\"2.0.0\"",
            None,
        )
        .unwrap();
        assert_eq!(lock.dependencies.len(), 2);
        assert_eq!(lock.dependencies[1], dep("github", "B/B", "2.0.0"));
    }

    #[test]
    fn unquoted_pin_is_an_error() {
        assert!(Lockfile::parse("github \"A/A\" 1.3.0\n", None).is_err());
    }

    #[test]
    fn truncated_entry_is_an_error() {
        assert!(Lockfile::parse("github \"A/A\"", None).is_err());
    }

    #[test]
    fn emission_sorts_by_name() {
        let lock = Lockfile {
            dependencies: vec![
                dep("github", "O/Zephyr", "2.0.0"),
                dep("github", "O/Aero", "1.0.0"),
            ],
        };
        assert_eq!(
            lock.emit(),
            "github \"O/Aero\" \"1.0.0\"\ngithub \"O/Zephyr\" \"2.0.0\"\n"
        );
    }

    #[test]
    fn round_trips_through_emission() {
        let lock = Lockfile {
            dependencies: vec![
                dep("git", "file:///tmp/repo", "8ff4393"),
                dep("github", "A/A", "1.3.0"),
            ],
        };
        let emitted = lock.emit();
        let reparsed = Lockfile::parse(&emitted, None).unwrap();
        assert_eq!(reparsed.emit(), emitted);
    }

    #[test]
    fn write_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cartelfile.resolved");
        let lock = Lockfile { dependencies: vec![dep("github", "A/A", "1.3.0")] };
        lock.write(&path).unwrap();
        let loaded = Lockfile::load(&path).unwrap().unwrap();
        assert_eq!(loaded.dependencies, lock.dependencies);
        assert!(Lockfile::load(&dir.path().join("missing")).unwrap().is_none());
    }
}
