//! Walking a repository and generating every directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::{DirEntry, WalkDir};

use crate::core::build_file::BuildFile;
use crate::core::config::ConfigStore;
use crate::core::rule::{ExistingTargetIndex, LoadInfo, Rule};
use crate::language::{GenerateArgs, ImportSpec, Language};
use crate::ops::render;
use crate::util::fs::{list_dir, relative_path, slash_path, write_string};
use crate::util::HostConfig;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["build", ".dart_tool", "node_modules", "bazel-out"];

/// What to do with generated rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Collect the would-be BUILD files without touching the tree
    #[default]
    Print,
    /// Update BUILD files in place, creating them where needed
    Fix,
}

/// A BUILD file that changed, or would change, in one directory.
#[derive(Debug, Clone)]
pub struct DirOutput {
    /// Slash-separated path of the directory relative to the root
    pub rel: String,
    /// The BUILD file: the existing one, or the one to create
    pub path: PathBuf,
    /// Complete new content of the BUILD file
    pub rendered: String,
    /// Number of new rules
    pub rules: usize,
}

/// Summary of a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub dirs_visited: usize,
    /// New rules added to BUILD files
    pub rules_generated: usize,
    /// Existing rules regenerated and merged in place
    pub rules_merged: usize,
    pub outputs: Vec<DirOutput>,
    pub files_written: Vec<PathBuf>,
}

/// One directory's generated rules, waiting for the resolve phase.
struct Pending {
    dir: PathBuf,
    rel: String,
    build_file: Option<BuildFile>,
    // (language index, rule, imports)
    rules: Vec<(usize, Rule, Vec<ImportSpec>)>,
    updates: Vec<Rule>,
}

/// Generate rules for every directory under `root`.
///
/// Directories are visited top-down in name order, so a directory is
/// always configured after its parent. Problems with a single directory
/// are logged and skipped.
pub fn run(
    root: &Path,
    host: &HostConfig,
    languages: &[Box<dyn Language>],
    mode: Mode,
) -> Result<WalkReport> {
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let mut store = ConfigStore::new(&host.repo_name);
    for lang in languages {
        lang.check_flags(host)
            .with_context(|| format!("invalid settings for language `{}`", lang.name()))?;
        lang.register_flags(host, &mut store);
    }

    let mut report = WalkReport::default();
    let mut pending = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        let rel = slash_path(&relative_path(root, dir));
        report.dirs_visited += 1;

        if let Some(p) = generate_dir(dir, &rel, host, languages, &mut store) {
            pending.push(p);
        }
    }

    let loads: Vec<LoadInfo> = languages.iter().flat_map(|l| l.loads()).collect();

    for p in pending {
        for (lang, rule, imports) in &p.rules {
            let lang = &languages[*lang];
            let indexed = lang.imports(rule, &p.dir);
            tracing::debug!(
                "{} `{}` in `{}` imports {} packages",
                rule.kind(),
                rule.name(),
                p.rel,
                indexed.len()
            );
            lang.resolve(rule, imports);
        }

        let rules: Vec<Rule> = p.rules.into_iter().map(|(_, rule, _)| rule).collect();
        report.rules_generated += rules.len();
        report.rules_merged += p.updates.len();

        let (path, rendered) = match &p.build_file {
            Some(existing) => {
                let rendered = render::update_file(existing, &rules, &p.updates, &loads);
                if rendered == existing.content {
                    tracing::debug!("{} is up to date", existing.path.display());
                    continue;
                }
                (existing.path.clone(), rendered)
            }
            None => (
                p.dir.join(host.primary_build_file_name()),
                render::render_file(&rules, &loads),
            ),
        };

        if mode == Mode::Fix {
            write_string(&path, &rendered)?;
            tracing::info!("Updated {}", path.display());
            report.files_written.push(path.clone());
        }

        report.outputs.push(DirOutput {
            rel: p.rel,
            path,
            rendered,
            rules: rules.len(),
        });
    }

    Ok(report)
}

/// Configure and generate a single directory.
fn generate_dir(
    dir: &Path,
    rel: &str,
    host: &HostConfig,
    languages: &[Box<dyn Language>],
    store: &mut ConfigStore,
) -> Option<Pending> {
    let listing = match list_dir(dir) {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!("skipping `{}`: {:#}", rel, e);
            return None;
        }
    };

    let build_file = match host
        .build_file_names
        .iter()
        .find(|name| listing.regular_files.contains(*name))
    {
        Some(name) => match BuildFile::load(&dir.join(name)) {
            Ok(file) => Some(file),
            Err(e) => {
                // Generating here could overwrite the unreadable file
                tracing::warn!("skipping `{}`: {:#}", rel, anyhow::Error::from(e));
                for lang in languages {
                    lang.configure(store, rel, None);
                }
                return None;
            }
        },
        None => None,
    };

    for lang in languages {
        lang.configure(store, rel, build_file.as_ref());
    }
    let config = store.get(rel);

    let existing = build_file
        .as_ref()
        .map(BuildFile::index)
        .unwrap_or_default();
    let mut other_gen = ExistingTargetIndex::new();
    let mut rules = Vec::new();
    let mut updates = Vec::new();

    for (i, lang) in languages.iter().enumerate() {
        let args = GenerateArgs {
            config,
            dir,
            rel,
            regular_files: &listing.regular_files,
            subdirs: &listing.subdirs,
            existing: &existing,
            other_gen: &other_gen,
            policy: host.classify_policy,
        };
        let (generated, refreshed) = lang.generate_rules(&args).into_parts();
        for g in generated {
            other_gen.insert(g.rule.kind().as_str(), g.rule.name());
            rules.push((i, g.rule, g.imports));
        }
        updates.extend(refreshed);
    }

    if rules.is_empty() && updates.is_empty() {
        return None;
    }

    Some(Pending {
        dir: dir.to_path_buf(),
        rel: rel.to_string(),
        build_file,
        rules,
        updates,
    })
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::default_languages;
    use std::fs;
    use tempfile::TempDir;

    const PUBSPEC: &str = "name: app\nenvironment:\n  sdk: ^3.0.0\n  flutter: any\n";
    const PUB_DEPS: &str = r#"{"packages": [
        {"name": "flutter", "dependency": "direct main", "source": "sdk"},
        {"name": "http", "dependency": "direct main", "source": "hosted"},
        {"name": "meta", "dependency": "transitive", "source": "hosted"}
    ]}"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "apps/demo/pubspec.yaml", PUBSPEC);
        write(root, "apps/demo/pub_deps.json", PUB_DEPS);
        write(root, "apps/demo/lib/main.dart", "import 'package:http/http.dart';\n");
        write(root, "apps/legacy/pubspec.yaml", PUBSPEC);
        write(root, "apps/demo/build/generated.dart", "");
        write(root, "apps/demo/.dart_tool/pubspec.yaml", PUBSPEC);
        write(
            root,
            "protos/BUILD.bazel",
            "proto_library(\n    name = \"api_proto\",\n    srcs = [\"api.proto\"],\n)\n",
        );
        write(root, "BUILD.bazel", "# gazelle:flutter_exclude apps/legacy\n");
        tmp
    }

    #[test]
    fn test_print_mode() {
        let tmp = workspace();
        let report = run(tmp.path(), &HostConfig::default(), &default_languages(), Mode::Print)
            .unwrap();

        let rels: Vec<_> = report.outputs.iter().map(|o| o.rel.as_str()).collect();
        assert_eq!(rels, vec!["apps/demo", "protos"]);
        assert_eq!(report.rules_generated, 2);
        assert!(report.files_written.is_empty());

        let demo = &report.outputs[0].rendered;
        assert!(demo.contains("flutter_library(\n    name = \"lib\",\n"));
        assert!(demo.contains("\"@flutter_sdk//flutter/packages/flutter:flutter\","));
        assert!(demo.contains("\"@pub_http//:http\","));
        assert!(!demo.contains("meta"));
        assert!(demo.contains("srcs = [\"lib/main.dart\"],"));

        let protos = &report.outputs[1].rendered;
        assert!(protos.contains("name = \"api_proto_dart\""));
    }

    #[test]
    fn test_fix_mode_is_idempotent() {
        let tmp = workspace();
        let host = HostConfig::default();

        let first = run(tmp.path(), &host, &default_languages(), Mode::Fix).unwrap();
        assert_eq!(first.files_written.len(), 2);

        let demo_build = tmp.path().join("apps/demo/BUILD.bazel");
        let written = fs::read_to_string(&demo_build).unwrap();
        assert!(written.starts_with("load(\"@rules_flutter//flutter:defs.bzl\", \"flutter_library\")"));

        let protos_build = fs::read_to_string(tmp.path().join("protos/BUILD.bazel")).unwrap();
        assert!(protos_build.starts_with("load(\"@rules_flutter//flutter:defs.bzl\", \"dart_proto_library\")\nproto_library("));

        let second = run(tmp.path(), &host, &default_languages(), Mode::Fix).unwrap();
        assert_eq!(second.rules_generated, 0);
        assert!(second.files_written.is_empty());
        assert_eq!(fs::read_to_string(&demo_build).unwrap(), written);
    }

    #[test]
    fn test_fix_mode_refreshes_stale_deps() {
        let tmp = workspace();
        let host = HostConfig::default();
        run(tmp.path(), &host, &default_languages(), Mode::Fix).unwrap();

        let demo_build = tmp.path().join("apps/demo/BUILD.bazel");
        let mut content = fs::read_to_string(&demo_build).unwrap();
        content.push_str("\nfilegroup(\n    name = \"assets\",\n)\n");
        fs::write(&demo_build, &content).unwrap();

        write(
            tmp.path(),
            "apps/demo/pub_deps.json",
            r#"{"packages": [
                {"name": "flutter", "dependency": "direct main", "source": "sdk"},
                {"name": "http", "dependency": "direct main", "source": "hosted"},
                {"name": "path", "dependency": "direct main", "source": "hosted"}
            ]}"#,
        );

        let second = run(tmp.path(), &host, &default_languages(), Mode::Fix).unwrap();
        assert_eq!(second.rules_generated, 0);
        assert_eq!(second.rules_merged, 1);
        assert_eq!(second.files_written, vec![demo_build.clone()]);

        let updated = fs::read_to_string(&demo_build).unwrap();
        assert!(updated.contains("        \"@pub_path//:path\",\n"));
        assert!(updated.contains("name = \"assets\""));
        assert_eq!(updated.matches("flutter_library(").count(), 1);
    }

    #[test]
    fn test_unreadable_build_file_is_left_alone() {
        let tmp = workspace();
        let build = tmp.path().join("apps/demo/BUILD.bazel");
        let original = b"# caf\xe9\nfilegroup(name = \"keep_me\")\n".to_vec();
        fs::write(&build, &original).unwrap();

        let report =
            run(tmp.path(), &HostConfig::default(), &default_languages(), Mode::Fix).unwrap();

        assert_eq!(fs::read(&build).unwrap(), original);
        assert!(!tmp.path().join("apps/demo/BUILD").exists());
        assert!(report.outputs.iter().all(|o| o.rel != "apps/demo"));
        assert!(tmp.path().join("protos/BUILD.bazel").exists());
    }

    #[test]
    fn test_print_mode_reuses_existing_build_file() {
        let tmp = workspace();
        write(
            tmp.path(),
            "apps/demo/BUILD",
            "load(\"@rules_flutter//flutter:defs.bzl\", \"flutter_library\")\n",
        );

        let report =
            run(tmp.path(), &HostConfig::default(), &default_languages(), Mode::Print).unwrap();
        let demo = &report.outputs[0];
        assert_eq!(demo.path, tmp.path().join("apps/demo/BUILD"));
        assert_eq!(demo.rendered.matches("load(").count(), 1);
        assert!(!demo.path.with_file_name("BUILD.bazel").exists());
    }

    #[test]
    fn test_repo_name_changes_sdk_repo() {
        let tmp = workspace();
        let host = HostConfig {
            repo_name: "my_app".to_string(),
            ..HostConfig::default()
        };
        let report = run(tmp.path(), &host, &default_languages(), Mode::Print).unwrap();
        assert!(report.outputs[0]
            .rendered
            .contains("@my_app++flutter+flutter_sdk//flutter/packages/flutter:flutter"));
    }

    #[test]
    fn test_generate_disabled_in_subtree() {
        let tmp = workspace();
        write(tmp.path(), "apps/BUILD.bazel", "# gazelle:flutter_generate false\n");

        let report =
            run(tmp.path(), &HostConfig::default(), &default_languages(), Mode::Print).unwrap();
        let rels: Vec<_> = report.outputs.iter().map(|o| o.rel.as_str()).collect();
        assert_eq!(rels, vec!["protos"]);
    }

    #[test]
    fn test_skips_hidden_and_build_dirs() {
        let tmp = workspace();
        let report =
            run(tmp.path(), &HostConfig::default(), &default_languages(), Mode::Print).unwrap();
        assert!(report
            .outputs
            .iter()
            .all(|o| !o.rel.contains(".dart_tool") && !o.rel.ends_with("/build")));
    }

    #[test]
    fn test_root_must_be_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, "").unwrap();
        assert!(run(&file, &HostConfig::default(), &default_languages(), Mode::Print).is_err());
    }
}
