//! Process-wide configuration.
//!
//! Settings that apply to a whole run rather than to one directory live in
//! an optional `pubgen.toml` at the repository root:
//!
//! ```toml
//! repo_name = "my_app"
//! build_file_names = ["BUILD.bazel", "BUILD"]
//! classify_policy = "any-direct"
//! sdk_repo = "@flutter_sdk"
//! ```
//!
//! Command-line flags take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::resolver::ClassifyPolicy;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "pubgen.toml";

/// Run-wide settings shared by every language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name of the main repository (bzlmod module name); drives the
    /// default SDK repository label
    pub repo_name: String,

    /// BUILD file names to read, in order of preference; the first one is
    /// used when a new file has to be created
    pub build_file_names: Vec<String>,

    /// Which locked dependencies become `deps`
    pub classify_policy: ClassifyPolicy,

    /// SDK repository for the root directory, overriding the computed
    /// default
    pub sdk_repo: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            repo_name: String::new(),
            build_file_names: vec!["BUILD.bazel".to_string(), "BUILD".to_string()],
            classify_policy: ClassifyPolicy::default(),
            sdk_repo: None,
        }
    }
}

impl HostConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't
    /// exist or is invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Load the project configuration of a repository root.
    pub fn for_repo(root: &Path) -> Self {
        Self::load_or_default(&project_config_path(root))
    }

    /// Preferred BUILD file name for new files.
    pub fn primary_build_file_name(&self) -> &str {
        self.build_file_names
            .first()
            .map(String::as_str)
            .unwrap_or("BUILD.bazel")
    }
}

/// Path of the project configuration file.
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}
