//! Mapping locked packages to Bazel labels.

use std::fmt;

use crate::core::config::FlutterConfig;
use crate::core::lockfile::{LockedDependency, RegistrySource};

/// Prefix of every repository created for a pub package.
pub const PUB_REPO_PREFIX: &str = "pub_";

/// SDK package that lives in the engine cache instead of `packages/`.
const SKY_ENGINE: &str = "sky_engine";

/// A Bazel label, `<repo>//<package>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    /// Repository including its `@` prefix; empty for the main repository
    pub repo: String,
    pub package: String,
    pub name: String,
}

impl Label {
    pub fn new(
        repo: impl Into<String>,
        package: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Label {
            repo: repo.into(),
            package: package.into(),
            name: name.into(),
        }
    }

    /// Default target of the repository generated for a pub package.
    pub fn pub_package(pkg: &str) -> Self {
        Label::new(format!("@{}", sanitize_repo_name(pkg)), "", pkg)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}//{}:{}", self.repo, self.package, self.name)
    }
}

/// Convert a package name to a valid Bazel repository name.
///
/// Must stay in sync with `_sanitize_repo_name` in the rules_flutter
/// module extension, which creates the repositories these names refer to.
pub fn sanitize_repo_name(pkg: &str) -> String {
    let mut result = String::with_capacity(PUB_REPO_PREFIX.len() + pkg.len());
    result.push_str(PUB_REPO_PREFIX);
    result.extend(pkg.chars().map(|ch| {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            ch
        } else {
            '_'
        }
    }));
    result
}

/// Path of an SDK package inside the Flutter SDK repository.
pub fn sdk_package_path(pkg: &str) -> String {
    if pkg == SKY_ENGINE {
        format!("flutter/bin/cache/pkg/{pkg}")
    } else {
        format!("flutter/packages/{pkg}")
    }
}

/// Label of an SDK package, or `None` if no SDK repository is configured.
pub fn sdk_dependency_label(pkg: &str, config: &FlutterConfig) -> Option<Label> {
    if config.sdk_repo.is_empty() {
        return None;
    }
    Some(Label::new(&config.sdk_repo, sdk_package_path(pkg), pkg))
}

/// Label a direct dependency resolves to.
///
/// `git`, `path` and other sources have no generated repository and
/// resolve to `None`.
pub fn resolve_label(dep: &LockedDependency, config: &FlutterConfig) -> Option<Label> {
    match dep.source {
        RegistrySource::Hosted => Some(Label::pub_package(&dep.name)),
        RegistrySource::Sdk => sdk_dependency_label(&dep.name, config),
        RegistrySource::Other(_) => None,
    }
}

/// Sorted label strings for a set of dependencies; unresolvable ones are
/// dropped.
pub fn dependency_labels<'a>(
    deps: impl IntoIterator<Item = &'a LockedDependency>,
    config: &FlutterConfig,
) -> Vec<String> {
    let mut labels: Vec<String> = deps
        .into_iter()
        .filter_map(|dep| {
            let label = resolve_label(dep, config);
            if label.is_none() {
                tracing::debug!("no label for `{}` (source {})", dep.name, dep.source);
            }
            label
        })
        .map(|label| label.to_string())
        .collect();
    labels.sort();
    labels.dedup();
    labels
}
