//! Cache-directory resolution.
//!
//! The repository cache lives in a single user-configurable directory. The
//! `CARTEL_CACHE_DIR` environment variable (with `~` expansion) overrides
//! the platform default under [`dirs::cache_dir`].

use std::path::PathBuf;

use crate::constants::CACHE_DIR_ENV;
use crate::core::{CartelError, Result};

/// The directory bare repository clones are stored under.
///
/// Precedence: an explicit `--cache-dir` override from the CLI, then
/// `CARTEL_CACHE_DIR`, then `<platform cache dir>/cartel/repositories`.
pub fn cache_dir(override_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.clone());
    }
    if let Ok(env_dir) = std::env::var(CACHE_DIR_ENV) {
        let expanded = shellexpand::tilde(&env_dir);
        return Ok(PathBuf::from(expanded.as_ref()));
    }
    dirs::cache_dir()
        .map(|base| base.join("cartel").join("repositories"))
        .ok_or_else(|| CartelError::InvalidArgument {
            description: format!(
                "no cache directory available; set {CACHE_DIR_ENV} explicitly"
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_override_wins() {
        let dir = PathBuf::from("/tmp/custom-cache");
        assert_eq!(cache_dir(Some(&dir)).unwrap(), dir);
    }

    #[test]
    fn default_is_under_platform_cache() {
        // The environment variable may be set by the harness; only assert
        // when resolution falls through to the platform default.
        if std::env::var(CACHE_DIR_ENV).is_err() {
            let dir = cache_dir(None).unwrap();
            assert!(dir.ends_with("cartel/repositories"));
        }
    }
}
