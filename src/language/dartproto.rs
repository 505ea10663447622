//! The `dartproto` language: Dart bindings for `proto_library` targets.

use crate::core::rule::RuleKind;
use crate::language::{GenerateArgs, GenerateResult, Language};
use crate::ops::generate::generate_proto_libraries;

#[derive(Debug, Clone, Copy, Default)]
pub struct DartProtoLanguage;

impl Language for DartProtoLanguage {
    fn name(&self) -> &'static str {
        "dartproto"
    }

    fn kinds(&self) -> &'static [RuleKind] {
        &[RuleKind::DartProtoLibrary]
    }

    fn generate_rules(&self, args: &GenerateArgs<'_>) -> GenerateResult {
        generate_proto_libraries(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FlutterConfig;
    use crate::core::rule::{AttrValue, ExistingTargetIndex, Rule};
    use crate::resolver::ClassifyPolicy;
    use std::path::Path;

    #[test]
    fn test_generates_from_existing_protos() {
        let config = FlutterConfig::new("");
        let existing: ExistingTargetIndex = [("proto_library", "b_proto"), ("proto_library", "a_proto")]
            .into_iter()
            .collect();
        let other_gen = ExistingTargetIndex::new();
        let args = GenerateArgs {
            config: &config,
            dir: Path::new("protos"),
            rel: "protos",
            regular_files: &[],
            subdirs: &[],
            existing: &existing,
            other_gen: &other_gen,
            policy: ClassifyPolicy::default(),
        };

        let result = DartProtoLanguage.generate_rules(&args);
        let names: Vec<_> = result.rules().map(Rule::name).collect();
        assert_eq!(names, vec!["a_proto_dart", "b_proto_dart"]);

        let first = result.rules().next().unwrap();
        assert_eq!(
            first.attr("deps"),
            Some(&AttrValue::List(vec![":a_proto".to_string()]))
        );
    }

    #[test]
    fn test_no_directives() {
        assert!(DartProtoLanguage.known_directives().is_empty());
        assert_eq!(
            DartProtoLanguage.loads()[0].symbols,
            vec!["dart_proto_library"]
        );
    }
}
