//! Generated rules and the metadata of the rule kinds pubgen emits.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// `.bzl` file that defines every rule kind pubgen emits.
pub const RULES_FLUTTER_DEFS: &str = "@rules_flutter//flutter:defs.bzl";

/// Rule kinds known to pubgen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    /// Flutter package library (needs the Flutter runtime)
    FlutterLibrary,
    /// Flutter application; declared for merging, never generated
    FlutterApp,
    /// Flutter widget test; declared for merging, never generated
    FlutterTest,
    /// Pure Dart library
    DartLibrary,
    /// Dart bindings for a `proto_library`
    DartProtoLibrary,
}

/// How the host should treat the attributes of a rule kind when merging
/// generated rules into hand-edited ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindInfo {
    /// Whether any rule of this kind matches regardless of name
    pub match_any: bool,
    /// A rule is considered empty, and may be deleted, without these
    pub non_empty_attrs: &'static [&'static str],
    /// Attributes the generator owns and overwrites on merge
    pub mergeable_attrs: &'static [&'static str],
    /// Attributes filled in during the resolve phase
    pub resolve_attrs: &'static [&'static str],
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::FlutterLibrary,
        RuleKind::FlutterApp,
        RuleKind::FlutterTest,
        RuleKind::DartLibrary,
        RuleKind::DartProtoLibrary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::FlutterLibrary => "flutter_library",
            RuleKind::FlutterApp => "flutter_app",
            RuleKind::FlutterTest => "flutter_test",
            RuleKind::DartLibrary => "dart_library",
            RuleKind::DartProtoLibrary => "dart_proto_library",
        }
    }

    pub fn info(&self) -> KindInfo {
        match self {
            RuleKind::FlutterLibrary => KindInfo {
                match_any: false,
                non_empty_attrs: &["pubspec"],
                mergeable_attrs: &["deps"],
                resolve_attrs: &["deps"],
            },
            RuleKind::FlutterApp | RuleKind::FlutterTest => KindInfo {
                match_any: false,
                non_empty_attrs: &["embed"],
                mergeable_attrs: &["srcs"],
                resolve_attrs: &["embed"],
            },
            RuleKind::DartLibrary => KindInfo {
                match_any: false,
                non_empty_attrs: &["srcs"],
                mergeable_attrs: &["deps"],
                resolve_attrs: &["deps"],
            },
            RuleKind::DartProtoLibrary => KindInfo {
                match_any: false,
                non_empty_attrs: &["deps"],
                mergeable_attrs: &["deps", "options"],
                resolve_attrs: &["deps"],
            },
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown rule kind `{s}`"))
    }
}

/// A `load()` statement required by generated rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadInfo {
    pub name: &'static str,
    pub symbols: Vec<&'static str>,
}

impl LoadInfo {
    /// Load statement for the given kinds from the rules_flutter defs file.
    pub fn rules_flutter(kinds: &[RuleKind]) -> Self {
        LoadInfo {
            name: RULES_FLUTTER_DEFS,
            symbols: kinds.iter().map(RuleKind::as_str).collect(),
        }
    }
}

/// Value of a rule attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    String(String),
    List(Vec<String>),
    /// `glob([...])`, expanded by Bazel rather than by pubgen
    Glob(Vec<String>),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::List(v)
    }
}

/// A build target to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    kind: RuleKind,
    name: String,
    attrs: BTreeMap<String, AttrValue>,
}

impl Rule {
    pub fn new(kind: RuleKind, name: impl Into<String>) -> Self {
        Rule {
            kind,
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Set an attribute, builder style.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Attribute values as strings: a list's items, a glob's patterns, or a
    /// single string.
    pub fn attr_strings(&self, key: &str) -> Vec<&str> {
        match self.attrs.get(key) {
            Some(AttrValue::String(s)) => vec![s.as_str()],
            Some(AttrValue::List(v) | AttrValue::Glob(v)) => v.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Attributes in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// `(kind, name)` pairs already declared in a directory.
///
/// Kinds are kept as strings because the index also holds rules pubgen
/// does not generate itself, such as `proto_library`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingTargetIndex {
    entries: BTreeSet<(String, String)>,
}

impl ExistingTargetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<String>, name: impl Into<String>) {
        self.entries.insert((kind.into(), name.into()));
    }

    pub fn contains(&self, kind: &str, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, n)| k == kind && n == name)
    }

    /// Whether any rule, of any kind, is named `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|(_, n)| n == name)
    }

    /// Names of every rule of `kind`, sorted.
    pub fn names_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == kind)
            .map(|(_, n)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ExistingTargetIndex {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut index = ExistingTargetIndex::new();
        for (kind, name) in iter {
            index.insert(kind, name);
        }
        index
    }
}

impl<'a> FromIterator<&'a Rule> for ExistingTargetIndex {
    fn from_iter<I: IntoIterator<Item = &'a Rule>>(iter: I) -> Self {
        iter.into_iter()
            .map(|r| (r.kind().as_str(), r.name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip_names() {
        for kind in RuleKind::ALL {
            assert_eq!(kind.as_str().parse::<RuleKind>().unwrap(), kind);
        }
        assert!("proto_library".parse::<RuleKind>().is_err());
    }

    #[test]
    fn test_kind_info() {
        let info = RuleKind::FlutterLibrary.info();
        assert_eq!(info.non_empty_attrs, &["pubspec"]);
        assert_eq!(info.resolve_attrs, &["deps"]);

        let proto = RuleKind::DartProtoLibrary.info();
        assert!(proto.mergeable_attrs.contains(&"options"));
        assert_eq!(RuleKind::FlutterApp.info(), RuleKind::FlutterTest.info());
    }

    #[test]
    fn test_rule_attrs() {
        let rule = Rule::new(RuleKind::DartLibrary, "lib")
            .with_attr("pubspec", "pubspec.yaml")
            .with_attr("deps", vec!["@pub_a//:a".to_string()]);

        assert_eq!(rule.attr_strings("pubspec"), vec!["pubspec.yaml"]);
        assert_eq!(rule.attr_strings("deps"), vec!["@pub_a//:a"]);
        assert!(rule.attr("srcs").is_none());
        assert_eq!(
            rule.attrs().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["deps", "pubspec"]
        );
    }

    #[test]
    fn test_existing_index() {
        let index: ExistingTargetIndex = [
            ("proto_library", "b_proto"),
            ("proto_library", "a_proto"),
            ("flutter_library", "lib"),
        ]
        .into_iter()
        .collect();

        assert!(index.contains("flutter_library", "lib"));
        assert!(!index.contains("dart_library", "lib"));
        assert!(index.contains_name("lib"));
        assert_eq!(
            index.names_of_kind("proto_library").collect::<Vec<_>>(),
            vec!["a_proto", "b_proto"]
        );
    }
}
