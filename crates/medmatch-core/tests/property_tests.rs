//! Property-based tests for parsing, normalization and similarity.

use medmatch_core::resolver::{
    dosages_match, names_are_similar, normalize_dosage_for_comparison, normalize_dosage_units,
    normalize_for_comparison, parse_medicine_name,
};
use proptest::prelude::*;

fn drug_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z]{1,10}", 1..4)
}

proptest! {
    #[test]
    fn parse_never_panics(raw in "\\PC{0,40}") {
        let parsed = parse_medicine_name(&raw);
        if raw.trim().is_empty() {
            prop_assert!(parsed.dosage.is_none());
        }
    }

    #[test]
    fn base_name_is_stable_under_reparse(words in drug_words(), dose in 1u32..5000) {
        let raw = format!("{}_{}mg", words.join("_"), dose);
        let once = parse_medicine_name(&raw);
        let twice = parse_medicine_name(&once.base_name);

        prop_assert_eq!(&twice.base_name, &once.base_name);
        prop_assert_eq!(twice.dosage, None);
        prop_assert_eq!(once.dosage, Some(format!("{}mg", dose)));
    }

    #[test]
    fn signature_ignores_separators(words in drug_words()) {
        let spaced = normalize_for_comparison(&words.join(" "));
        prop_assert_eq!(&spaced, &normalize_for_comparison(&words.join("_")));
        prop_assert_eq!(&spaced, &normalize_for_comparison(&words.join("+")));
        prop_assert_eq!(&spaced, &normalize_for_comparison(&words.concat()));
    }

    #[test]
    fn dosage_key_ignores_combinator(a in 1u32..5000, b in 1u32..5000) {
        let plus = normalize_dosage_for_comparison(&format!("{}mg+{}mg", a, b));
        prop_assert_eq!(&plus, &normalize_dosage_for_comparison(&format!("{}mg/{}mg", a, b)));
        prop_assert_eq!(&plus, &normalize_dosage_for_comparison(&format!("{}mg {}mg", a, b)));
    }

    #[test]
    fn similarity_is_reflexive(s in "[a-z]{0,15}") {
        prop_assert!(names_are_similar(&s, &s));
    }

    #[test]
    fn similarity_is_symmetric(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
        prop_assert_eq!(names_are_similar(&a, &b), names_are_similar(&b, &a));
    }

    #[test]
    fn grams_equal_milligrams(mg in 1u32..100_000) {
        let grams = format!("{}g", mg as f64 / 1000.0);
        let milligrams = format!("{}mg", mg);

        prop_assert_eq!(dosages_match(Some(&milligrams), Some(&grams), 0.1), Some(true));

        let units = normalize_dosage_units(&grams);
        prop_assert_eq!(units.len(), 1);
        prop_assert_eq!(units[0].unit.as_str(), "mg");
        prop_assert!((units[0].value - mg as f64).abs() < 1e-6);
    }
}

#[test]
fn test_documented_unit_equivalence() {
    assert_eq!(
        normalize_dosage_units("2500mg"),
        normalize_dosage_units("2.5g")
    );
    assert_eq!(dosages_match(Some("2500mg"), Some("2.5g"), 0.1), Some(true));
}
