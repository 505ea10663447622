//! Rule generation for a single directory.

use std::collections::BTreeSet;

use crate::core::config::FlutterConfig;
use crate::core::lockfile::LockFile;
use crate::core::pubspec::{Pubspec, PUBSPEC_NAME};
use crate::core::rule::{Rule, RuleKind};
use crate::language::{GenerateArgs, GenerateResult, GeneratedRule};
use crate::resolver::{classify, dependency_labels, ClassifyPolicy};
use crate::util::fs::collect_files;

/// Conventional Dart sources directory.
pub const LIB_DIR: &str = "lib";

/// Kind of rule pubgen reads `dart_proto_library` targets from.
pub const PROTO_LIBRARY_KIND: &str = "proto_library";

/// Suffix appended to a `proto_library` name to name its Dart bindings.
pub const DART_PROTO_SUFFIX: &str = "_dart";

/// Whether generation is switched on for the directory at all.
fn is_enabled(config: &FlutterConfig, rel: &str) -> bool {
    if !config.generate {
        tracing::debug!("generation disabled in `{rel}`");
        return false;
    }
    if config.is_excluded(rel) {
        tracing::debug!("`{rel}` is excluded");
        return false;
    }
    true
}

/// Choose the library kind from the pubspec's environment.
///
/// A pubspec that could not be read falls back to `flutter_library`.
pub fn library_kind(pubspec: Option<&Pubspec>) -> RuleKind {
    match pubspec {
        Some(p) if !p.has_flutter_environment() && p.has_sdk_environment() => {
            RuleKind::DartLibrary
        }
        _ => RuleKind::FlutterLibrary,
    }
}

/// Sorted `deps` labels for a lockfile.
pub fn generate_deps(lock: &LockFile, config: &FlutterConfig, policy: ClassifyPolicy) -> Vec<String> {
    let direct = classify(lock, policy);
    dependency_labels(direct.values(), config)
}

/// Generate the `flutter_library` or `dart_library` of a pub package.
///
/// When the BUILD file already declares a library of the same kind and
/// name, the fresh rule is returned as an update so its mergeable
/// attributes can be refreshed. A name taken by any other rule suppresses
/// generation.
pub fn generate_library(args: &GenerateArgs<'_>) -> GenerateResult {
    let config = args.config;
    let name = config.library_name.as_str();

    if !is_enabled(config, args.rel) || !args.has_file(PUBSPEC_NAME) {
        return GenerateResult::empty();
    }

    if args.other_gen.contains_name(name) {
        tracing::debug!("`{}` is already generated in `{}`, skipping", name, args.rel);
        return GenerateResult::empty();
    }

    let pubspec = match Pubspec::load_dir(args.dir) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::debug!("ignoring pubspec: {:#}", anyhow::Error::from(e));
            None
        }
    };

    let lock = match LockFile::load_dir(args.dir, args.regular_files) {
        Ok(lock) => lock,
        Err(e) => {
            tracing::debug!("ignoring lockfile: {:#}", anyhow::Error::from(e));
            None
        }
    };

    let kind = library_kind(pubspec.as_ref());
    let declared = args.existing.contains(kind.as_str(), name);
    if !declared && args.existing.contains_name(name) {
        tracing::debug!(
            "`{}` already declares `{}` with another kind, skipping",
            args.rel,
            name
        );
        return GenerateResult::empty();
    }

    let mut rule = Rule::new(kind, &config.library_name).with_attr("pubspec", PUBSPEC_NAME);

    if args.has_subdir(LIB_DIR) {
        let srcs = collect_files(args.dir, LIB_DIR);
        if !srcs.is_empty() {
            rule = rule.with_attr("srcs", srcs);
        }
    }

    if let Some(lock) = lock {
        let deps = generate_deps(&lock, config, args.policy);
        if !deps.is_empty() {
            rule = rule.with_attr("deps", deps);
        }
    }

    let mut result = GenerateResult::empty();
    if declared {
        tracing::debug!("refreshing {} `{}` in `{}`", kind, rule.name(), args.rel);
        result.push_update(rule);
    } else {
        tracing::debug!("generated {} `{}` in `{}`", kind, rule.name(), args.rel);
        result.push(GeneratedRule::resolved(rule));
    }
    result
}

/// Generate a `dart_proto_library` for every `proto_library` in the
/// directory that does not have one yet.
pub fn generate_proto_libraries(args: &GenerateArgs<'_>) -> GenerateResult {
    if !is_enabled(args.config, args.rel) {
        return GenerateResult::empty();
    }

    let protos: BTreeSet<&str> = args
        .other_gen
        .names_of_kind(PROTO_LIBRARY_KIND)
        .chain(args.existing.names_of_kind(PROTO_LIBRARY_KIND))
        .collect();

    let dart_kind = RuleKind::DartProtoLibrary.as_str();

    protos
        .into_iter()
        .filter_map(|proto| {
            let dart_name = format!("{proto}{DART_PROTO_SUFFIX}");
            if args.existing.contains(dart_kind, &dart_name)
                || args.other_gen.contains(dart_kind, &dart_name)
            {
                return None;
            }
            let rule = Rule::new(RuleKind::DartProtoLibrary, dart_name)
                .with_attr("deps", vec![format!(":{proto}")]);
            Some(GeneratedRule::resolved(rule))
        })
        .collect()
}
