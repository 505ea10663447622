//! The plugin surface a host build-file generator drives.
//!
//! A host walks the repository top-down. At each directory it calls
//! [`Language::configure`] on every language, then
//! [`Language::generate_rules`], and finally, once every directory has
//! been generated, [`Language::resolve`] on each generated rule with the
//! imports it was paired with.

use std::path::Path;

use anyhow::Result;

use crate::core::build_file::BuildFile;
use crate::core::config::{ConfigStore, FlutterConfig};
use crate::core::rule::{ExistingTargetIndex, LoadInfo, Rule, RuleKind};
use crate::resolver::ClassifyPolicy;
use crate::util::HostConfig;

pub mod dartproto;
pub mod flutter;

pub use dartproto::DartProtoLanguage;
pub use flutter::FlutterLanguage;

/// An import extracted from a rule's sources, to be resolved later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportSpec {
    /// Language the import belongs to
    pub lang: &'static str,
    /// Import path, e.g. `package:collection/collection.dart`
    pub imp: String,
}

/// Inputs for generating one directory.
#[derive(Debug, Clone, Copy)]
pub struct GenerateArgs<'a> {
    /// Configuration in effect for this directory
    pub config: &'a FlutterConfig,

    /// Absolute (or cwd-relative) path of the directory
    pub dir: &'a Path,

    /// Slash-separated path relative to the repository root; `""` for the
    /// root itself
    pub rel: &'a str,

    /// Regular files directly in the directory
    pub regular_files: &'a [String],

    /// Immediate subdirectories
    pub subdirs: &'a [String],

    /// Rules already declared in the directory's BUILD file
    pub existing: &'a ExistingTargetIndex,

    /// Rules generated for this directory by languages that ran earlier
    /// in the same pass
    pub other_gen: &'a ExistingTargetIndex,

    /// Which locked dependencies become `deps`
    pub policy: ClassifyPolicy,
}

impl GenerateArgs<'_> {
    pub fn has_file(&self, name: &str) -> bool {
        self.regular_files.iter().any(|f| f == name)
    }

    pub fn has_subdir(&self, name: &str) -> bool {
        self.subdirs.iter().any(|d| d == name)
    }
}

/// A generated rule together with the imports the resolve phase needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRule {
    pub rule: Rule,
    pub imports: Vec<ImportSpec>,
}

impl GeneratedRule {
    /// A rule whose dependencies are already final.
    pub fn resolved(rule: Rule) -> Self {
        GeneratedRule {
            rule,
            imports: Vec::new(),
        }
    }
}

/// Output of [`Language::generate_rules`].
///
/// Each rule is stored with its own import placeholder, so the host
/// always receives exactly one placeholder per rule.
///
/// Rules regenerated for targets the BUILD file already declares are kept
/// apart as updates. They are merged into the existing call and never
/// count as new targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResult {
    rules: Vec<GeneratedRule>,
    updates: Vec<Rule>,
}

impl GenerateResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, generated: GeneratedRule) {
        self.rules.push(generated);
    }

    /// Record a fresh rendition of a rule the BUILD file already declares.
    pub fn push_update(&mut self, rule: Rule) {
        self.updates.push(rule);
    }

    /// Fresh renditions of already declared rules.
    pub fn updates(&self) -> &[Rule] {
        &self.updates
    }

    /// Split into new rules and updates.
    pub fn into_parts(self) -> (Vec<GeneratedRule>, Vec<Rule>) {
        (self.rules, self.updates)
    }

    /// Generated rules, in emission order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(|g| &g.rule)
    }

    /// Import placeholders, parallel to [`GenerateResult::rules`].
    pub fn imports(&self) -> impl Iterator<Item = &[ImportSpec]> {
        self.rules.iter().map(|g| g.imports.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<GeneratedRule> for GenerateResult {
    fn from_iter<I: IntoIterator<Item = GeneratedRule>>(iter: I) -> Self {
        GenerateResult {
            rules: iter.into_iter().collect(),
            updates: Vec::new(),
        }
    }
}

/// A language extension.
pub trait Language {
    /// Short identifier, e.g. `flutter`.
    fn name(&self) -> &'static str;

    /// Seed run-wide settings into the configuration store before the walk.
    fn register_flags(&self, _host: &HostConfig, _store: &mut ConfigStore) {}

    /// Validate run-wide settings.
    fn check_flags(&self, _host: &HostConfig) -> Result<()> {
        Ok(())
    }

    /// Directive keys this language understands.
    fn known_directives(&self) -> &'static [&'static str] {
        &[]
    }

    /// Record the configuration of `rel` from its BUILD file, if any.
    fn configure(&self, _store: &mut ConfigStore, _rel: &str, _file: Option<&BuildFile>) {}

    /// Rule kinds this language may emit or merge.
    fn kinds(&self) -> &'static [RuleKind];

    /// `load()` statements the emitted kinds require.
    fn loads(&self) -> Vec<LoadInfo> {
        vec![LoadInfo::rules_flutter(self.kinds())]
    }

    /// Generate the rules of one directory.
    fn generate_rules(&self, args: &GenerateArgs<'_>) -> GenerateResult;

    /// Imports of an existing or generated rule, for indexing.
    fn imports(&self, _rule: &Rule, _dir: &Path) -> Vec<ImportSpec> {
        Vec::new()
    }

    /// Finalize a generated rule's dependencies from its imports.
    fn resolve(&self, _rule: &Rule, _imports: &[ImportSpec]) {}
}

/// Every language pubgen ships, in the order they run.
pub fn default_languages() -> Vec<Box<dyn Language>> {
    vec![Box::new(FlutterLanguage), Box::new(DartProtoLanguage)]
}
