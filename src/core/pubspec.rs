//! `pubspec.yaml` descriptor.
//!
//! Only the fields that drive rule generation are decoded: the package
//! name, the declared dependencies and the `environment` markers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{read_file, ParseError};

/// File name of the package manifest.
pub const PUBSPEC_NAME: &str = "pubspec.yaml";

/// Environment key marking a package that needs the Flutter runtime.
const FLUTTER_ENVIRONMENT: &str = "flutter";

/// Environment key marking a package that only needs the Dart SDK.
const SDK_ENVIRONMENT: &str = "sdk";

/// Decoded `pubspec.yaml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pubspec {
    /// Package name
    pub name: String,

    /// Declared dependency constraints, keyed by package name
    pub dependencies: BTreeMap<String, serde_yaml::Value>,

    /// Environment constraints (`sdk`, `flutter`, ...)
    pub environment: BTreeMap<String, serde_yaml::Value>,
}

/// Raw pubspec as deserialized from YAML.
///
/// YAML allows a key with no value (`dependencies:`), which decodes to
/// null rather than an empty map, hence the `Option`s.
#[derive(Debug, Deserialize)]
struct RawPubspec {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_yaml::Value>>,

    #[serde(default)]
    environment: Option<BTreeMap<String, serde_yaml::Value>>,
}

impl Pubspec {
    /// Load a pubspec from a file path.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let content = read_file(path)?;
        Self::parse(&content, path)
    }

    /// Load the pubspec of a package directory.
    pub fn load_dir(dir: &Path) -> Result<Self, ParseError> {
        Self::load(&dir.join(PUBSPEC_NAME))
    }

    /// Parse pubspec content. `path` is only used for error reporting.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ParseError> {
        let raw: RawPubspec = serde_yaml::from_str(content).map_err(|source| ParseError::Yaml {
            path: PathBuf::from(path),
            source,
        })?;

        Ok(Pubspec {
            name: raw.name.unwrap_or_default(),
            dependencies: raw.dependencies.unwrap_or_default(),
            environment: raw.environment.unwrap_or_default(),
        })
    }

    /// Whether `environment.flutter` is declared.
    pub fn has_flutter_environment(&self) -> bool {
        self.environment.contains_key(FLUTTER_ENVIRONMENT)
    }

    /// Whether `environment.sdk` is declared.
    pub fn has_sdk_environment(&self) -> bool {
        self.environment.contains_key(SDK_ENVIRONMENT)
    }

    /// Declared dependency names, sorted.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }
}
