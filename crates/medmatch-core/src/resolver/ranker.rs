//! Best-match selection over retrieved candidates.
//!
//! The first candidate whose name matches wins; there is no global scoring.
//! Retrieval order (most specific pattern first) is what makes this sound.

use tracing::debug;

use super::normalizer::{normalize_dosage_for_comparison, normalize_for_comparison};
use super::parser::parse_medicine_name;
use super::similarity::{same_dosage, signatures_match};
use crate::config::{MatcherConfig, SimilarityStrategy};
use crate::models::{MatchResult, MatchType, ParsedName, Product};

/// Same name, same dosage.
pub const EXACT_CONFIDENCE: f64 = 0.95;

/// Same name, both dosages known but different.
pub const DOSAGE_MISMATCH_CONFIDENCE: f64 = 0.80;

/// Same name, dosage missing on either side.
pub const NAME_ONLY_CONFIDENCE: f64 = 0.85;

/// Picks the best catalog match for a parsed query.
#[derive(Debug, Clone, Copy)]
pub struct MatchRanker {
    similarity: SimilarityStrategy,
}

impl MatchRanker {
    pub fn new(config: &MatcherConfig) -> Self {
        Self {
            similarity: config.similarity,
        }
    }

    /// First candidate whose base name matches the query, classified by dosage.
    pub fn rank(&self, candidates: &[Product], query: &ParsedName) -> Option<MatchResult> {
        let query_signature = normalize_for_comparison(&query.base_name);
        let query_key = dosage_key(query.dosage.as_deref());

        for product in candidates {
            let candidate = parse_medicine_name(&product.name);
            let signature = normalize_for_comparison(&candidate.base_name);

            if !signatures_match(self.similarity, &query_signature, &signature, true) {
                continue;
            }

            let candidate_key = dosage_key(candidate.dosage.as_deref());
            let (match_type, confidence) = if query_key.is_empty() || candidate_key.is_empty() {
                (MatchType::NameOnly, NAME_ONLY_CONFIDENCE)
            } else if same_dosage(query.dosage.as_deref(), candidate.dosage.as_deref()) {
                (MatchType::Exact, EXACT_CONFIDENCE)
            } else {
                (MatchType::NameOnly, DOSAGE_MISMATCH_CONFIDENCE)
            };

            debug!(
                product_id = %product.id,
                match_type = match_type.as_str(),
                confidence,
                "Candidate matched"
            );
            return Some(MatchResult {
                product: product.clone(),
                match_type,
                confidence,
            });
        }

        None
    }
}

fn dosage_key(dosage: Option<&str>) -> String {
    dosage.map(normalize_dosage_for_comparison).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str) -> Product {
        Product::new(id.into(), name.into())
    }

    fn ranker() -> MatchRanker {
        MatchRanker::new(&MatcherConfig::default())
    }

    #[test]
    fn test_exact_match() {
        let candidates = vec![product("P001", "Paracetamol_500mg")];
        let query = parse_medicine_name("Paracetamol 500mg");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.product.id, "P001");
        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.confidence, EXACT_CONFIDENCE);
    }

    #[test]
    fn test_exact_across_units() {
        let candidates = vec![product("P001", "Augmentin 0.5g")];
        let query = parse_medicine_name("Augmentin 500mg");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.match_type, MatchType::Exact);
    }

    #[test]
    fn test_dosage_mismatch() {
        let candidates = vec![product("P001", "Paracetamol 250mg")];
        let query = parse_medicine_name("Paracetamol 500mg");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.match_type, MatchType::NameOnly);
        assert_eq!(result.confidence, DOSAGE_MISMATCH_CONFIDENCE);
    }

    #[test]
    fn test_nearby_strength_is_name_only() {
        let candidates = vec![product("P001", "Paracetamol_525mg")];
        let query = parse_medicine_name("Paracetamol 500mg");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.product.id, "P001");
        assert_eq!(result.match_type, MatchType::NameOnly);
        assert_eq!(result.confidence, DOSAGE_MISMATCH_CONFIDENCE);
    }

    #[test]
    fn test_missing_dosage() {
        let candidates = vec![product("P001", "Paracetamol 500mg")];
        let query = parse_medicine_name("Paracetamol");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.match_type, MatchType::NameOnly);
        assert_eq!(result.confidence, NAME_ONLY_CONFIDENCE);
    }

    #[test]
    fn test_first_match_wins() {
        let candidates = vec![
            product("P001", "Ibuprofen 400mg"),
            product("P002", "Paracetamol 250mg"),
            product("P003", "Paracetamol 500mg"),
        ];
        let query = parse_medicine_name("Paracetamol 500mg");

        // P003 would be exact, but P002 comes first.
        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.product.id, "P002");
        assert_eq!(result.match_type, MatchType::NameOnly);
    }

    #[test]
    fn test_ocr_truncation_matches() {
        let candidates = vec![product("P001", "SIMETHICON B 80mg")];
        let query = parse_medicine_name("SIMETHICON 80mg");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.match_type, MatchType::Exact);
    }

    #[test]
    fn test_containment_matches() {
        let candidates = vec![product("P001", "Panadol Extra 500mg")];
        let query = parse_medicine_name("Panadol 500mg");

        let result = ranker().rank(&candidates, &query).unwrap();
        assert_eq!(result.product.id, "P001");
    }

    #[test]
    fn test_no_match() {
        let candidates = vec![product("P001", "Ibuprofen 400mg")];
        let query = parse_medicine_name("Paracetamol 500mg");

        assert!(ranker().rank(&candidates, &query).is_none());
        assert!(ranker().rank(&[], &query).is_none());
    }

    #[test]
    fn test_levenshtein_strategy() {
        let config = MatcherConfig {
            similarity: SimilarityStrategy::BoundedLevenshtein { max_distance: 2 },
            ..Default::default()
        };
        let candidates = vec![product("P001", "Ibuprofen 400mg")];
        let query = parse_medicine_name("Ibuporfen 400mg");

        assert!(ranker().rank(&candidates, &query).is_none());
        let result = MatchRanker::new(&config).rank(&candidates, &query).unwrap();
        assert_eq!(result.match_type, MatchType::Exact);
    }
}
