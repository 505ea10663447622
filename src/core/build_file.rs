//! Best-effort reading of existing BUILD files.
//!
//! pubgen does not parse Starlark. It only needs three things from a
//! BUILD file:
//! - `# gazelle:<key> <value>` directives
//! - the kind and name of every rule already declared
//! - which symbols are already loaded, so a rewrite does not load twice

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::{read_file, ParseError};
use crate::core::rule::ExistingTargetIndex;

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*gazelle:(\w+)\s*(.*?)\s*$").unwrap());

static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

static NAME_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bname\s*=\s*"([^"]*)""#).unwrap());

static STRING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

/// A `# gazelle:` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: String,
    pub value: String,
}

impl Directive {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Directive {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A rule call found in a BUILD file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredRule {
    pub kind: String,
    pub name: String,
    /// Byte range of the whole call in the file, through the closing paren
    pub span: Range<usize>,
}

/// What pubgen knows about an existing BUILD file.
#[derive(Debug, Clone, Default)]
pub struct BuildFile {
    /// Location on disk
    pub path: PathBuf,

    /// Raw content, kept so fix mode can append to it
    pub content: String,

    /// Directives in file order
    pub directives: Vec<Directive>,

    /// Declared rules in file order
    pub rules: Vec<DeclaredRule>,

    /// Loaded symbols, keyed by the `.bzl` label they come from
    pub loads: BTreeMap<String, BTreeSet<String>>,
}

impl BuildFile {
    /// Load a BUILD file from disk.
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let content = read_file(path)?;
        Ok(Self::parse(&content, path))
    }

    /// Scan BUILD file content. Never fails; anything unrecognized is skipped.
    pub fn parse(content: &str, path: &Path) -> Self {
        let directives = content
            .lines()
            .filter_map(|line| DIRECTIVE_RE.captures(line))
            .map(|caps| Directive::new(&caps[1], &caps[2]))
            .collect();

        let mut rules = Vec::new();
        let mut loads: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for caps in CALL_RE.captures_iter(content) {
            let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let rest = &content[whole.end()..];
            let body = call_body(rest);
            let end = if body.len() < rest.len() {
                whole.end() + body.len() + 1
            } else {
                content.len()
            };

            if kind.as_str() == "load" {
                let mut strings = STRING_RE.captures_iter(body).map(|c| c[1].to_string());
                if let Some(label) = strings.next() {
                    loads.entry(label).or_default().extend(strings);
                }
                continue;
            }

            if let Some(name) = NAME_ATTR_RE.captures(body) {
                rules.push(DeclaredRule {
                    kind: kind.as_str().to_string(),
                    name: name[1].to_string(),
                    span: whole.start()..end,
                });
            }
        }

        BuildFile {
            path: path.to_path_buf(),
            content: content.to_string(),
            directives,
            rules,
            loads,
        }
    }

    /// Index of the rules declared in this file.
    pub fn index(&self) -> ExistingTargetIndex {
        self.rules
            .iter()
            .map(|r| (r.kind.as_str(), r.name.as_str()))
            .collect()
    }

    /// The declared rule of `kind` named `name`, if any.
    pub fn declared(&self, kind: &str, name: &str) -> Option<&DeclaredRule> {
        self.rules.iter().find(|r| r.kind == kind && r.name == name)
    }

    /// Whether `symbol` is already loaded from `label`.
    pub fn is_loaded(&self, label: &str, symbol: &str) -> bool {
        self.loads
            .get(label)
            .is_some_and(|symbols| symbols.contains(symbol))
    }
}

/// Text of a call's arguments up to the matching close paren.
///
/// Parens inside string literals and comments are ignored. An unterminated
/// call runs to the end of the input.
fn call_body(rest: &str) -> &str {
    let mut depth = 1usize;
    let mut in_string: Option<char> = None;
    let mut in_comment = false;
    let mut escaped = false;

    for (i, ch) in rest.char_indices() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '#' => in_comment = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &rest[..i];
                }
            }
            _ => {}
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# gazelle:flutter_exclude third_party
#gazelle:flutter_generate   yes
load("@rules_flutter//flutter:defs.bzl", "flutter_library")
load("@rules_proto//proto:defs.bzl",
    "proto_library",
)

# A hand-written comment mentioning foo(name = "ghost")
proto_library(
    name = "api_proto",
    srcs = ["api.proto"],
)

flutter_library(
    name = "lib",
    pubspec = "pubspec.yaml",
    srcs = glob(["lib/**"]),  # trailing ) in comment
)

exports_files(["LICENSE"])
"#;

    #[test]
    fn test_parse_directives() {
        let file = BuildFile::parse(SAMPLE, Path::new("BUILD.bazel"));
        assert_eq!(
            file.directives,
            vec![
                Directive::new("flutter_exclude", "third_party"),
                Directive::new("flutter_generate", "yes"),
            ]
        );
    }

    #[test]
    fn test_parse_rules() {
        let file = BuildFile::parse(SAMPLE, Path::new("BUILD.bazel"));
        let kinds: Vec<_> = file
            .rules
            .iter()
            .map(|r| (r.kind.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(kinds, vec![("proto_library", "api_proto"), ("flutter_library", "lib")]);

        let lib = file.declared("flutter_library", "lib").unwrap();
        let call = &SAMPLE[lib.span.clone()];
        assert!(call.starts_with("flutter_library(\n    name = \"lib\","));
        assert!(call.ends_with("# trailing ) in comment\n)"));
        assert!(file.declared("proto_library", "lib").is_none());

        let index = file.index();
        assert!(index.contains("proto_library", "api_proto"));
        assert!(!index.contains("flutter_library", "api_proto"));
    }

    #[test]
    fn test_parse_loads() {
        let file = BuildFile::parse(SAMPLE, Path::new("BUILD.bazel"));
        assert!(file.is_loaded("@rules_flutter//flutter:defs.bzl", "flutter_library"));
        assert!(!file.is_loaded("@rules_flutter//flutter:defs.bzl", "dart_library"));
        assert!(file.is_loaded("@rules_proto//proto:defs.bzl", "proto_library"));
    }

    #[test]
    fn test_directive_without_value() {
        let file = BuildFile::parse("# gazelle:flutter_sdk_repo\n", Path::new("BUILD"));
        assert_eq!(file.directives, vec![Directive::new("flutter_sdk_repo", "")]);
    }

    #[test]
    fn test_unterminated_call() {
        let file = BuildFile::parse("flutter_library(\n    name = \"lib\",\n", Path::new("BUILD"));
        assert_eq!(file.rules.len(), 1);
        assert_eq!(file.rules[0].span.end, file.content.len());
    }
}
