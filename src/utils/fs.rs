//! Filesystem helpers: atomic writes, recursive copies, symlink replacement.

use std::fs;
use std::io::Write;
use std::path::Path;

use walkdir::WalkDir;

use crate::core::{CartelError, Result};

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| CartelError::write(path, &e))
}

/// Atomically write `content` to `path` using a write-then-rename strategy.
///
/// The file either contains the new content or the old content, never a
/// partial write. Parent directories are created as needed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| CartelError::write(&temp_path, &e))?;
        file.write_all(content).map_err(|e| CartelError::write(&temp_path, &e))?;
        file.sync_all().map_err(|e| CartelError::write(&temp_path, &e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| CartelError::write(path, &e))
}

/// Recursively copy a directory tree, overwriting existing files.
///
/// Symlinks inside the source are copied as the files they point at, which
/// matches how framework bundles are consumed from the output tree.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| CartelError::ReadFailed {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root");
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|e| CartelError::write(&target, &e))?;
        }
    }
    Ok(())
}

/// Remove a file, directory, or symlink if it exists.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CartelError::read(path, &e)),
    };
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| CartelError::write(path, &e))
}

/// Replace `link` with a symlink pointing at `target`.
///
/// Any existing file, directory, or symlink at `link` is removed first.
pub fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    remove_if_exists(link)?;
    if let Some(parent) = link.parent() {
        ensure_dir(parent)?;
    }
    symlink_dir(target, link).map_err(|e| CartelError::write(link, &e))
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}
