//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Files and subdirectories directly inside a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    /// Regular file names, sorted
    pub regular_files: Vec<String>,
    /// Subdirectory names, sorted
    pub subdirs: Vec<String>,
}

/// List a directory. Entries whose names are not valid UTF-8 are skipped.
pub fn list_dir(dir: &Path) -> Result<DirListing> {
    let mut listing = DirListing::default();

    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let ty = entry.file_type()?;
        if ty.is_dir() {
            listing.subdirs.push(name);
        } else if ty.is_file() {
            listing.regular_files.push(name);
        }
    }

    listing.regular_files.sort();
    listing.subdirs.sort();
    Ok(listing)
}

/// Every file under `base/subdir`, as sorted slash-separated paths
/// relative to `base`.
///
/// Unreadable entries are skipped.
pub fn collect_files(base: &Path, subdir: &str) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(base.join(subdir))
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| slash_path(&relative_path(base, entry.path())))
        .collect();

    files.sort();
    files
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path with `/` separators, as used in BUILD files and
/// Gazelle-style relative directory names. The current directory is `""`.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Write a string to a file, with nice error messages.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}
