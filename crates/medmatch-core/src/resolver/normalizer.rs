//! Comparison normalizers.
//!
//! Handles:
//! - Name signatures (letters only, lowercase)
//! - Dosage keys (letters and digits, separators stripped)
//! - Structured dosage values (mass converted to mg)

use super::parser::{first_segment, DoseUnit};
use crate::models::DosageUnit;

impl DoseUnit {
    /// Canonical unit with multiplier into it.
    ///
    /// Mass converts to mg. Volume, percent and international units are
    /// separate families that never convert into each other.
    pub fn canonical(&self) -> (&'static str, f64) {
        match self {
            DoseUnit::Mg => ("mg", 1.0),
            DoseUnit::G => ("mg", 1000.0),
            DoseUnit::Mcg => ("mg", 0.001),
            DoseUnit::Ml => ("ml", 1.0),
            DoseUnit::L => ("l", 1.0),
            DoseUnit::Percent => ("%", 1.0),
            DoseUnit::Iu => ("iu", 1.0),
        }
    }
}

/// Letters-only lowercase signature used as the name-matching key.
///
/// `"SIMETHICON B 80mg"` and `"SIMETHICON_B_80mg"` both become `"simethiconb"`.
pub fn normalize_for_comparison(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// Alphanumeric dosage key.
///
/// `"2500mg+500mg"`, `"2500mg/500mg"` and `"2500mg 500mg"` all become
/// `"2500mg500mg"`.
pub fn normalize_dosage_for_comparison(dosage: &str) -> String {
    dosage
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '+' | '-' | '/'))
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Convert a `/`-separated dosage into values in canonical units.
///
/// Segments without a recognizable `value unit` become the zero sentinel.
pub fn normalize_dosage_units(dosage: &str) -> Vec<DosageUnit> {
    dosage
        .split('/')
        .map(|segment| match first_segment(segment.trim()) {
            Some(parsed) => {
                let (unit, multiplier) = parsed.unit.canonical();
                DosageUnit {
                    value: parsed.value * multiplier,
                    unit: unit.to_string(),
                }
            }
            None => DosageUnit::sentinel(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_strips_everything_but_letters() {
        assert_eq!(normalize_for_comparison("SIMETHICON B 80mg"), "simethiconb");
        assert_eq!(normalize_for_comparison("SIMETHICON_B_80mg"), "simethiconb");
        assert_eq!(normalize_for_comparison("Vit. C-500 (x)"), "vitcx");
        assert_eq!(normalize_for_comparison(""), "");
        assert_eq!(normalize_for_comparison("123 456"), "");
    }

    #[test]
    fn test_signature_drops_non_ascii_letters() {
        assert_eq!(normalize_for_comparison("Hộp"), "hp");
    }

    #[test]
    fn test_dosage_key() {
        assert_eq!(normalize_dosage_for_comparison("2500mg+500mg"), "2500mg500mg");
        assert_eq!(normalize_dosage_for_comparison("2500mg/500mg"), "2500mg500mg");
        assert_eq!(normalize_dosage_for_comparison("2500mg 500mg"), "2500mg500mg");
        assert_eq!(normalize_dosage_for_comparison("2.5 G"), "25g");
        assert_eq!(normalize_dosage_for_comparison("10%"), "10");
    }

    #[test]
    fn test_units_gram_to_mg() {
        assert_eq!(
            normalize_dosage_units("2500mg"),
            normalize_dosage_units("2.5g")
        );
        assert_eq!(
            normalize_dosage_units("2.5g"),
            vec![DosageUnit {
                value: 2500.0,
                unit: "mg".into()
            }]
        );
    }

    #[test]
    fn test_units_mcg_to_mg() {
        let units = normalize_dosage_units("500mcg");
        assert_eq!(units.len(), 1);
        assert!((units[0].value - 0.5).abs() < 1e-9);
        assert_eq!(units[0].unit, "mg");
    }

    #[test]
    fn test_units_other_families_pass_through() {
        let units = normalize_dosage_units("5ml/1L/10%/400UI");
        let names: Vec<&str> = units.iter().map(|u| u.unit.as_str()).collect();
        assert_eq!(names, vec!["ml", "l", "%", "iu"]);
        assert_eq!(units[1].value, 1.0);
        assert_eq!(units[3].value, 400.0);
    }

    #[test]
    fn test_unparseable_segment_is_sentinel() {
        assert_eq!(
            normalize_dosage_units("500mg/abc"),
            vec![
                DosageUnit {
                    value: 500.0,
                    unit: "mg".into()
                },
                DosageUnit::sentinel()
            ]
        );
        assert_eq!(normalize_dosage_units(""), vec![DosageUnit::sentinel()]);
    }
}
