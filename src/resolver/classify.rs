//! Selecting the direct dependencies of a package from its lockfile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::lockfile::{DependencyKind, LockFile, LockedDependency, RegistrySource};

/// Which locked entries become `deps` of the generated library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifyPolicy {
    /// Every entry in the `direct` family, whatever its source
    #[default]
    AnyDirect,

    /// Only entries that are exactly `direct main` and served by a pub
    /// registry
    HostedDirectMain,
}

impl ClassifyPolicy {
    fn accepts(&self, dep: &LockedDependency) -> bool {
        match self {
            ClassifyPolicy::AnyDirect => dep.kind.is_direct(),
            ClassifyPolicy::HostedDirectMain => {
                dep.kind == DependencyKind::DirectMain && dep.source == RegistrySource::Hosted
            }
        }
    }
}

/// Direct dependencies of a lockfile, keyed by package name.
pub fn direct_dependencies(lock: &LockFile) -> BTreeMap<String, LockedDependency> {
    classify(lock, ClassifyPolicy::AnyDirect)
}

/// Entries accepted by `policy`, keyed by package name.
///
/// Entries with no name are dropped. If a name repeats, the last entry wins.
pub fn classify(lock: &LockFile, policy: ClassifyPolicy) -> BTreeMap<String, LockedDependency> {
    lock.packages
        .iter()
        .filter(|dep| !dep.name.is_empty() && policy.accepts(dep))
        .map(|dep| (dep.name.clone(), dep.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lockfile::LockSchema;

    fn dep(name: &str, kind: &str, source: &str) -> LockedDependency {
        LockedDependency {
            name: name.to_string(),
            kind: DependencyKind::parse(kind),
            source: RegistrySource::parse(source),
            version: "1.0.0".to_string(),
        }
    }

    fn lock(packages: Vec<LockedDependency>) -> LockFile {
        LockFile {
            schema: LockSchema::PubDeps,
            packages,
        }
    }

    #[test]
    fn test_includes_all_direct_kinds() {
        let lock = lock(vec![
            dep("direct-main", "direct main", "hosted"),
            dep("direct-dev", "direct dev", "sdk"),
            dep("direct-overridden", "direct overridden", "path"),
            dep("transitive", "transitive", "hosted"),
        ]);

        let got = direct_dependencies(&lock);
        assert_eq!(
            got.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["direct-dev", "direct-main", "direct-overridden"]
        );
    }

    #[test]
    fn test_transitive_never_included() {
        let mut packages: Vec<_> = (0..50)
            .map(|i| dep(&format!("t{i}"), "transitive", "hosted"))
            .collect();
        packages.push(dep("only", "direct main", "hosted"));

        let got = direct_dependencies(&lock(packages));
        assert_eq!(got.len(), 1);
        assert!(got.contains_key("only"));
    }

    #[test]
    fn test_skips_unnamed_entries() {
        let got = direct_dependencies(&lock(vec![dep("", "direct main", "hosted")]));
        assert!(got.is_empty());
    }

    #[test]
    fn test_same_rule_for_both_schemas() {
        let json = r#"{"packages": [
            {"name": "a", "dependency": "direct main", "source": "hosted"},
            {"name": "b", "dependency": "transitive", "source": "hosted"}
        ]}"#;
        let yaml = r#"
packages:
  a:
    dependency: "direct main"
    source: hosted
    version: "1.0.0"
  b:
    dependency: transitive
    source: hosted
    version: "1.0.0"
"#;
        let path = std::path::Path::new("lock");
        let from_json = direct_dependencies(&LockFile::parse_pub_deps(json, path).unwrap());
        let from_yaml = direct_dependencies(&LockFile::parse_pubspec_lock(yaml, path).unwrap());
        assert_eq!(
            from_json.keys().collect::<Vec<_>>(),
            from_yaml.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_hosted_direct_main_policy() {
        let lock = lock(vec![
            dep("hosted-main", "direct main", "hosted"),
            dep("hosted-dev", "direct dev", "hosted"),
            dep("sdk-main", "direct main", "sdk"),
        ]);

        let got = classify(&lock, ClassifyPolicy::HostedDirectMain);
        assert_eq!(got.keys().collect::<Vec<_>>(), vec!["hosted-main"]);
    }

    #[test]
    fn test_unknown_direct_flavor_only_matches_any_direct() {
        let lock = lock(vec![
            dep("hosted-main", "direct main", "hosted"),
            dep("hosted-xyz", "direct xyz", "hosted"),
        ]);

        let strict = classify(&lock, ClassifyPolicy::HostedDirectMain);
        assert_eq!(strict.keys().collect::<Vec<_>>(), vec!["hosted-main"]);

        let any = classify(&lock, ClassifyPolicy::AnyDirect);
        assert_eq!(
            any.keys().collect::<Vec<_>>(),
            vec!["hosted-main", "hosted-xyz"]
        );
    }
}
