//! Dart `package:` import scanning.
//!
//! Dependencies come from the lockfile, not from imports. This scan only
//! feeds the import index the host may use for cross-package lookups.

use std::path::Path;

use crate::resolver::Label;

const PACKAGE_SCHEME: &str = "package:";

/// `package:` import paths in Dart source, in file order.
///
/// Only lines that start with `import ` are considered; relative and
/// `dart:` imports are skipped.
pub fn parse_imports(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("import "))
        .filter_map(quoted)
        .filter(|imp| imp.starts_with(PACKAGE_SCHEME))
        .map(str::to_string)
        .collect()
}

/// First quoted string on a line, with either quote style.
fn quoted(line: &str) -> Option<&str> {
    let start = line.find(['\'', '"'])?;
    let quote = line[start..].chars().next()?;
    let rest = &line[start + 1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

/// Label of the pub repository that provides a `package:` import.
pub fn resolve_package_import(imp: &str) -> Option<Label> {
    let path = imp.strip_prefix(PACKAGE_SCHEME)?;
    let pkg = path.split('/').next().filter(|p| !p.is_empty())?;
    Some(Label::pub_package(pkg))
}

/// `package:` imports of every `.dart` file in `srcs`, relative to `dir`.
///
/// Files that cannot be read are skipped.
pub fn scan_sources<'a>(dir: &Path, srcs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut imports = Vec::new();
    for src in srcs.into_iter().filter(|s| s.ends_with(".dart")) {
        match std::fs::read_to_string(dir.join(src)) {
            Ok(content) => imports.extend(parse_imports(&content)),
            Err(e) => tracing::debug!("cannot scan {}: {}", src, e),
        }
    }
    imports.sort();
    imports.dedup();
    imports
}
