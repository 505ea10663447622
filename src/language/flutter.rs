//! The `flutter` language: one library rule per pub package.

use std::path::Path;

use anyhow::Result;

use crate::core::build_file::BuildFile;
use crate::core::config::{ConfigStore, FlutterConfig, KNOWN_DIRECTIVES};
use crate::core::rule::{Rule, RuleKind};
use crate::language::{GenerateArgs, GenerateResult, ImportSpec, Language};
use crate::ops::generate::generate_library;
use crate::ops::imports::scan_sources;
use crate::util::HostConfig;

const LANG_NAME: &str = "flutter";

const KINDS: &[RuleKind] = &[
    RuleKind::FlutterLibrary,
    RuleKind::FlutterApp,
    RuleKind::FlutterTest,
    RuleKind::DartLibrary,
];

/// Generates `flutter_library` and `dart_library` targets from
/// `pubspec.yaml` and the resolved lockfile beside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlutterLanguage;

impl FlutterLanguage {
    fn sdk_repo_override(host: &HostConfig) -> Option<&str> {
        host.sdk_repo.as_deref().filter(|r| !r.is_empty())
    }
}

impl Language for FlutterLanguage {
    fn name(&self) -> &'static str {
        LANG_NAME
    }

    fn register_flags(&self, host: &HostConfig, store: &mut ConfigStore) {
        if let Some(repo) = Self::sdk_repo_override(host) {
            let mut root = FlutterConfig::new(store.repo_name());
            root.sdk_repo = repo.to_string();
            store.set_root(root);
        }
    }

    fn check_flags(&self, host: &HostConfig) -> Result<()> {
        if let Some(repo) = Self::sdk_repo_override(host) {
            if !repo.starts_with('@') {
                anyhow::bail!("SDK repository `{}` must start with `@`", repo);
            }
        }
        Ok(())
    }

    fn known_directives(&self) -> &'static [&'static str] {
        KNOWN_DIRECTIVES
    }

    fn configure(&self, store: &mut ConfigStore, rel: &str, file: Option<&BuildFile>) {
        let directives = file.map(|f| f.directives.as_slice()).unwrap_or_default();
        store.configure(rel, directives);
    }

    fn kinds(&self) -> &'static [RuleKind] {
        KINDS
    }

    fn generate_rules(&self, args: &GenerateArgs<'_>) -> GenerateResult {
        generate_library(args)
    }

    fn imports(&self, rule: &Rule, dir: &Path) -> Vec<ImportSpec> {
        scan_sources(dir, rule.attr_strings("srcs"))
            .into_iter()
            .map(|imp| ImportSpec {
                lang: LANG_NAME,
                imp,
            })
            .collect()
    }
}
