//! Locked dependency graphs.
//!
//! Two schemas describe the same information:
//! - `pub_deps.json`, the output of `flutter pub deps --json`, a flat list
//!   of packages
//! - `pubspec.lock`, the resolved lock written by `pub get`, a map keyed by
//!   package name
//!
//! Both decode into a [`LockFile`] of [`LockedDependency`] entries so that
//! classification never has to care which one it was given.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{read_file, ParseError};

/// File name of the `pub deps --json` output.
pub const PUB_DEPS_NAME: &str = "pub_deps.json";

/// File name of the resolved pub lockfile.
pub const PUBSPEC_LOCK_NAME: &str = "pubspec.lock";

/// How a package entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Listed under `dependencies`
    DirectMain,
    /// Listed under `dev_dependencies`
    DirectDev,
    /// Listed under `dependency_overrides`
    DirectOverridden,
    /// A `direct` flavor this version does not recognize
    DirectOther,
    /// Pulled in by another package
    Transitive,
}

impl DependencyKind {
    /// Parse pub's `dependency` field.
    ///
    /// Anything in the `direct` family is direct. An unrecognized `direct`
    /// flavor is kept apart as [`DependencyKind::DirectOther`] so it only
    /// matches policies that take every direct entry. Everything else
    /// (including `root`) is transitive.
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix("direct") {
            Some(rest) => match rest.trim() {
                "dev" => DependencyKind::DirectDev,
                "main" => DependencyKind::DirectMain,
                "overridden" => DependencyKind::DirectOverridden,
                _ => DependencyKind::DirectOther,
            },
            None => DependencyKind::Transitive,
        }
    }

    /// Whether the package owner declared this dependency explicitly.
    pub fn is_direct(&self) -> bool {
        !matches!(self, DependencyKind::Transitive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::DirectMain => "direct main",
            DependencyKind::DirectDev => "direct dev",
            DependencyKind::DirectOverridden => "direct overridden",
            DependencyKind::DirectOther => "direct",
            DependencyKind::Transitive => "transitive",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a locked package is served from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistrySource {
    /// A pub registry (pub.dev or a mirror)
    Hosted,
    /// Shipped inside the Flutter SDK
    Sdk,
    /// `git`, `path`, or anything else
    Other(String),
}

impl RegistrySource {
    pub fn parse(s: &str) -> Self {
        match s {
            "hosted" => RegistrySource::Hosted,
            "sdk" => RegistrySource::Sdk,
            other => RegistrySource::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Hosted => f.write_str("hosted"),
            RegistrySource::Sdk => f.write_str("sdk"),
            RegistrySource::Other(s) => f.write_str(s),
        }
    }
}

/// One package pinned by a lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedDependency {
    pub name: String,
    pub kind: DependencyKind,
    pub source: RegistrySource,
    pub version: String,
}

/// Which on-disk schema a [`LockFile`] was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockSchema {
    PubDeps,
    PubspecLock,
}

/// A decoded lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockFile {
    pub schema: LockSchema,
    pub packages: Vec<LockedDependency>,
}

#[derive(Debug, Deserialize)]
struct RawPubDeps {
    #[serde(default)]
    packages: Vec<RawPubDepsPackage>,
}

#[derive(Debug, Deserialize)]
struct RawPubDepsPackage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    dependency: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct RawPubspecLock {
    #[serde(default)]
    packages: Option<BTreeMap<String, RawLockedPackage>>,
}

#[derive(Debug, Deserialize)]
struct RawLockedPackage {
    #[serde(default)]
    dependency: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    version: String,
}

impl LockFile {
    /// Parse `pub deps --json` output.
    pub fn parse_pub_deps(content: &str, path: &Path) -> Result<Self, ParseError> {
        let raw: RawPubDeps = serde_json::from_str(content).map_err(|source| ParseError::Json {
            path: PathBuf::from(path),
            source,
        })?;

        let packages = raw
            .packages
            .into_iter()
            .map(|pkg| LockedDependency {
                name: pkg.name,
                kind: DependencyKind::parse(&pkg.dependency),
                source: RegistrySource::parse(&pkg.source),
                version: pkg.version,
            })
            .collect();

        Ok(LockFile {
            schema: LockSchema::PubDeps,
            packages,
        })
    }

    /// Parse a `pubspec.lock`.
    pub fn parse_pubspec_lock(content: &str, path: &Path) -> Result<Self, ParseError> {
        let raw: RawPubspecLock =
            serde_yaml::from_str(content).map_err(|source| ParseError::Yaml {
                path: PathBuf::from(path),
                source,
            })?;

        let packages = raw
            .packages
            .unwrap_or_default()
            .into_iter()
            .map(|(name, pkg)| LockedDependency {
                name,
                kind: DependencyKind::parse(&pkg.dependency),
                source: RegistrySource::parse(&pkg.source),
                version: pkg.version,
            })
            .collect();

        Ok(LockFile {
            schema: LockSchema::PubspecLock,
            packages,
        })
    }

    /// Load a lockfile, choosing the schema from its file name.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let file_name = path.file_name().and_then(|n| n.to_str());
        match file_name {
            Some(PUB_DEPS_NAME) => Self::parse_pub_deps(&read_file(path)?, path),
            Some(PUBSPEC_LOCK_NAME) => Self::parse_pubspec_lock(&read_file(path)?, path),
            _ => Err(ParseError::UnknownLockfile {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Load the lockfile of a package directory given its file listing.
    ///
    /// `pub_deps.json` wins over `pubspec.lock` when both are present.
    /// Returns `Ok(None)` when the directory has neither.
    pub fn load_dir(dir: &Path, regular_files: &[String]) -> Result<Option<Self>, ParseError> {
        for name in [PUB_DEPS_NAME, PUBSPEC_LOCK_NAME] {
            if regular_files.iter().any(|f| f == name) {
                return Self::load(&dir.join(name)).map(Some);
            }
        }
        Ok(None)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dependency_kind_parse() {
        assert_eq!(DependencyKind::parse("direct main"), DependencyKind::DirectMain);
        assert_eq!(DependencyKind::parse("direct dev"), DependencyKind::DirectDev);
        assert_eq!(
            DependencyKind::parse("direct overridden"),
            DependencyKind::DirectOverridden
        );
        assert_eq!(DependencyKind::parse("transitive"), DependencyKind::Transitive);
        assert_eq!(DependencyKind::parse("root"), DependencyKind::Transitive);
        assert_eq!(DependencyKind::parse(""), DependencyKind::Transitive);
        assert_eq!(DependencyKind::parse("direct"), DependencyKind::DirectOther);
        assert_eq!(DependencyKind::parse("direct xyz"), DependencyKind::DirectOther);
        assert!(DependencyKind::parse("direct xyz").is_direct());
        assert_ne!(DependencyKind::parse("direct mainline"), DependencyKind::DirectMain);
    }

    #[test]
    fn test_parse_pub_deps() {
        let content = r#"{
  "root": "app",
  "packages": [
    {"name": "app", "version": "1.0.0", "kind": "root", "source": "root", "dependency": "root"},
    {"name": "vector_math", "version": "2.1.4", "source": "hosted", "dependency": "direct main"},
    {"name": "flutter", "version": "0.0.0", "source": "sdk", "dependency": "direct main"},
    {"name": "collection", "version": "1.18.0", "source": "hosted", "dependency": "transitive"}
  ]
}"#;
        let lock = LockFile::parse_pub_deps(content, Path::new(PUB_DEPS_NAME)).unwrap();
        assert_eq!(lock.schema, LockSchema::PubDeps);
        assert_eq!(lock.len(), 4);
        assert_eq!(lock.packages[1].source, RegistrySource::Hosted);
        assert_eq!(lock.packages[2].source, RegistrySource::Sdk);
        assert_eq!(lock.packages[0].source, RegistrySource::Other("root".into()));
        assert_eq!(lock.packages[3].kind, DependencyKind::Transitive);
    }

    #[test]
    fn test_parse_pubspec_lock() {
        let content = r#"
packages:
  collection:
    dependency: transitive
    description:
      name: collection
      url: "https://pub.dev"
    source: hosted
    version: "1.18.0"
  flutter:
    dependency: "direct main"
    description: flutter
    source: sdk
    version: "0.0.0"
sdks:
  dart: ">=3.2.0 <4.0.0"
"#;
        let lock = LockFile::parse_pubspec_lock(content, Path::new(PUBSPEC_LOCK_NAME)).unwrap();
        assert_eq!(lock.schema, LockSchema::PubspecLock);
        assert_eq!(lock.len(), 2);
        assert_eq!(lock.packages[0].name, "collection");
        assert_eq!(lock.packages[1].kind, DependencyKind::DirectMain);
        assert_eq!(lock.packages[1].version, "0.0.0");
    }

    #[test]
    fn test_load_dir_prefers_pub_deps() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(PUB_DEPS_NAME),
            r#"{"packages": [{"name": "a", "dependency": "direct main", "source": "hosted"}]}"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join(PUBSPEC_LOCK_NAME), "packages: {}\n").unwrap();

        let files = vec![PUBSPEC_LOCK_NAME.to_string(), PUB_DEPS_NAME.to_string()];
        let lock = LockFile::load_dir(tmp.path(), &files).unwrap().unwrap();
        assert_eq!(lock.schema, LockSchema::PubDeps);
    }

    #[test]
    fn test_load_dir_without_lockfile() {
        let tmp = TempDir::new().unwrap();
        assert!(LockFile::load_dir(tmp.path(), &[]).unwrap().is_none());
    }

    #[test]
    fn test_load_malformed_json() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PUB_DEPS_NAME), "{ not json").unwrap();

        let files = vec![PUB_DEPS_NAME.to_string()];
        let err = LockFile::load_dir(tmp.path(), &files).unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn test_load_unknown_name() {
        let err = LockFile::load(Path::new("deps.txt")).unwrap_err();
        assert!(matches!(err, ParseError::UnknownLockfile { .. }));
    }
}
