//! Per-directory configuration driven by `# gazelle:` directives.
//!
//! Every directory starts from a clone of its parent's [`FlutterConfig`]
//! and then applies the directives of its own BUILD file. Configuration is
//! looked up through a [`ConfigStore`] passed explicitly to every caller.

use std::collections::HashMap;

use crate::core::build_file::Directive;

/// Excludes a directory (exact relative path) from generation.
pub const DIRECTIVE_EXCLUDE: &str = "flutter_exclude";

/// Overrides the default `lib` name of generated library targets.
pub const DIRECTIVE_LIBRARY_NAME: &str = "flutter_library_name";

/// Turns generation on (`true`, `yes`, `1`) or off (anything else).
pub const DIRECTIVE_GENERATE: &str = "flutter_generate";

/// Overrides the repository that SDK-provided packages resolve into.
pub const DIRECTIVE_SDK_REPO: &str = "flutter_sdk_repo";

/// Default name of a generated library target.
pub const DEFAULT_LIBRARY_NAME: &str = "lib";

/// All directives understood by the flutter language.
pub const KNOWN_DIRECTIVES: &[&str] = &[
    DIRECTIVE_EXCLUDE,
    DIRECTIVE_LIBRARY_NAME,
    DIRECTIVE_GENERATE,
    DIRECTIVE_SDK_REPO,
];

/// Flutter generation settings for one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlutterConfig {
    /// Relative directories to skip (exact match)
    pub exclude: Vec<String>,

    /// Name of generated library targets
    pub library_name: String,

    /// Whether library rules are generated at all
    pub generate: bool,

    /// Repository prefix for SDK-provided packages, e.g. `@flutter_sdk`
    pub sdk_repo: String,
}

impl FlutterConfig {
    /// Configuration used where no directive has applied yet.
    pub fn new(repo_name: &str) -> Self {
        FlutterConfig {
            exclude: Vec::new(),
            library_name: DEFAULT_LIBRARY_NAME.to_string(),
            generate: true,
            sdk_repo: default_sdk_repo(repo_name),
        }
    }

    /// Apply a single directive. Unknown keys are ignored.
    pub fn apply_directive(&mut self, key: &str, value: &str, repo_name: &str) {
        match key {
            DIRECTIVE_EXCLUDE => self.exclude.push(value.to_string()),
            DIRECTIVE_LIBRARY_NAME => self.library_name = value.to_string(),
            DIRECTIVE_GENERATE => self.generate = matches!(value, "true" | "yes" | "1"),
            DIRECTIVE_SDK_REPO => {
                self.sdk_repo = if value.is_empty() {
                    default_sdk_repo(repo_name)
                } else {
                    value.to_string()
                };
            }
            _ => {}
        }
    }

    /// Apply directives in order.
    pub fn apply_directives<'a>(
        &mut self,
        directives: impl IntoIterator<Item = &'a Directive>,
        repo_name: &str,
    ) {
        for d in directives {
            self.apply_directive(&d.key, &d.value, repo_name);
        }
    }

    /// Whether `rel` exactly matches an exclusion pattern.
    pub fn is_excluded(&self, rel: &str) -> bool {
        self.exclude.iter().any(|pattern| pattern == rel)
    }
}

/// SDK repository name for a main repository.
///
/// Under bzlmod the SDK repo created by the `flutter` module extension has
/// the canonical name `<repo>++flutter+flutter_sdk`.
pub fn default_sdk_repo(repo_name: &str) -> String {
    if repo_name.is_empty() {
        "@flutter_sdk".to_string()
    } else {
        format!("@{repo_name}++flutter+flutter_sdk")
    }
}

/// Flutter configuration for every directory visited so far.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    repo_name: String,
    root: FlutterConfig,
    configs: HashMap<String, FlutterConfig>,
}

impl ConfigStore {
    pub fn new(repo_name: impl Into<String>) -> Self {
        let repo_name = repo_name.into();
        let root = FlutterConfig::new(&repo_name);
        ConfigStore {
            repo_name,
            root,
            configs: HashMap::new(),
        }
    }

    /// Name of the main repository, used to compute the default SDK repo.
    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    /// Replace the configuration inherited by directories with no
    /// configured ancestor.
    pub fn set_root(&mut self, config: FlutterConfig) {
        self.root = config;
    }

    /// Configuration for `rel`.
    ///
    /// Falls back to the nearest configured ancestor, then to the root
    /// default, so this never fails.
    pub fn get(&self, rel: &str) -> &FlutterConfig {
        let mut current = Some(rel);
        while let Some(dir) = current {
            if let Some(config) = self.configs.get(dir) {
                return config;
            }
            current = parent_rel(dir);
        }
        &self.root
    }

    /// Derive and record the configuration of `rel` from its parent and
    /// its own directives.
    pub fn configure<'a>(
        &mut self,
        rel: &str,
        directives: impl IntoIterator<Item = &'a Directive>,
    ) -> &FlutterConfig {
        let mut config = match parent_rel(rel) {
            Some(parent) => self.get(parent).clone(),
            None => self.root.clone(),
        };
        config.apply_directives(directives, &self.repo_name);
        self.configs.insert(rel.to_string(), config);
        self.get(rel)
    }
}

/// Parent of a slash-separated relative path; `None` for the root (`""`).
fn parent_rel(rel: &str) -> Option<&str> {
    if rel.is_empty() {
        return None;
    }
    Some(rel.rfind('/').map_or("", |i| &rel[..i]))
}
