//! Property tests for name patterns and the parser.
#![cfg(feature = "proptest")]

use jseek::search::{NamePattern, PatternTarget};
use jseek::{LimitTo, SearchFor, SearchPattern};
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

fn arb_ident() -> impl Strategy<Value = String> {
    "[A-Za-z_$][A-Za-z0-9_$]{0,12}"
}

fn arb_qualified() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_ident(), 1..5)
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn test_literal_pattern_matches_itself(name in arb_ident()) {
        prop_assert!(NamePattern::new(name.as_str(), true).matches(&name));
        prop_assert!(NamePattern::new(name.to_lowercase(), false).matches(&name));
    }

    #[test]
    fn test_star_suffix_matches_any_extension(name in arb_ident(), tail in "[a-z0-9]{0,6}") {
        let pattern = NamePattern::new(format!("{name}*"), true);
        let extended = format!("{name}{tail}");
        prop_assert!(pattern.matches(&extended));
    }

    #[test]
    fn test_question_mark_needs_exactly_one_char(name in arb_ident()) {
        let pattern = NamePattern::new(format!("{name}?"), true);
        prop_assert!(!pattern.matches(&name));
        let longer = format!("{name}x");
        prop_assert!(pattern.matches(&longer));
    }

    #[test]
    fn test_qualified_names_parse(segments in arb_qualified()) {
        let text = segments.join(".");
        let pattern = SearchPattern::from_string(&text, SearchFor::Type, LimitTo::AllOccurrences, true).unwrap();
        let PatternTarget::Name { name, qualifier, params, .. } = pattern.target else {
            panic!("expected a name pattern");
        };
        prop_assert_eq!(name.as_str(), segments[segments.len() - 1].as_str());
        prop_assert_eq!(
            qualifier.map(|q| q.as_str().to_string()),
            (segments.len() > 1).then(|| segments[..segments.len() - 1].join("."))
        );
        prop_assert!(params.is_none());
    }

    #[test]
    fn test_method_parameter_count_is_kept(name in arb_ident(), params in prop::collection::vec(arb_ident(), 0..4)) {
        let text = format!("{}({})", name, params.join(", "));
        let pattern = SearchPattern::from_string(&text, SearchFor::Method, LimitTo::References, true).unwrap();
        let PatternTarget::Name { params: parsed, .. } = pattern.target else {
            panic!("expected a name pattern");
        };
        prop_assert_eq!(parsed.map(|p| p.len()), Some(params.len()));
    }

    #[test]
    fn test_parser_never_panics(text in "[ -~\n\t]{0,120}") {
        let _ = jseek::syntax::parse(&text);
    }
}
