//! Matching models shared by the parser, ranker and similar-medicine finder.

use serde::{Deserialize, Serialize};

use super::Product;

/// A medicine name split into its base name and dosage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedName {
    /// Drug name with dosage and packaging annotations removed
    pub base_name: String,
    /// `/`-joined dosage tokens (e.g., "2500mg/500mg")
    pub dosage: Option<String>,
}

impl ParsedName {
    /// First whitespace-delimited token of the base name.
    pub fn first_token(&self) -> Option<&str> {
        self.base_name.split_whitespace().next()
    }
}

/// One dosage segment with mass normalized to milligrams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DosageUnit {
    pub value: f64,
    /// "mg", "ml", "l", "%", "iu", or "" for an unparseable segment
    pub unit: String,
}

impl DosageUnit {
    /// Placeholder for a segment that could not be parsed.
    pub fn sentinel() -> Self {
        Self {
            value: 0.0,
            unit: String::new(),
        }
    }
}

/// How a query matched a catalog product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Same drug, same dosage
    Exact,
    /// Same drug, dosage differs or is unknown
    NameOnly,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::NameOnly => "name_only",
        }
    }
}

/// Best catalog match for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub product: Product,
    pub match_type: MatchType,
    /// Fixed per match branch, in [0, 1]
    pub confidence: f64,
}

/// Why a product was suggested as similar to the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    SameNameSameDosage,
    SameNameDifferentDosage,
    SameIndicationSameDosage,
    SameIndicationDifferentDosage,
    FromReferenceCollection,
    SimilarName,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::SameNameSameDosage => "same_name_same_dosage",
            MatchReason::SameNameDifferentDosage => "same_name_different_dosage",
            MatchReason::SameIndicationSameDosage => "same_indication_same_dosage",
            MatchReason::SameIndicationDifferentDosage => "same_indication_different_dosage",
            MatchReason::FromReferenceCollection => "from_reference_collection",
            MatchReason::SimilarName => "similar_name",
        }
    }
}

/// A related product suggested for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarMatch {
    pub product: Product,
    pub match_reason: MatchReason,
    pub confidence: f64,
    /// False when the product was synthesized from a reference entry
    pub in_catalog: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_token() {
        let parsed = ParsedName {
            base_name: "Vitamin C Sui".into(),
            dosage: None,
        };
        assert_eq!(parsed.first_token(), Some("Vitamin"));

        let empty = ParsedName {
            base_name: "  ".into(),
            dosage: None,
        };
        assert_eq!(empty.first_token(), None);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchType::NameOnly).unwrap(),
            "\"name_only\""
        );
        assert_eq!(
            serde_json::to_string(&MatchReason::SameIndicationDifferentDosage).unwrap(),
            format!("\"{}\"", MatchReason::SameIndicationDifferentDosage.as_str())
        );
    }
}
