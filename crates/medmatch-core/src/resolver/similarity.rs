//! Name similarity and dosage comparison.
//!
//! The positional check is a cheap approximation, not edit distance. It
//! tolerates characters lost at the end of a name (a common OCR failure) and a
//! small share of substitutions at matching positions. It misses
//! transpositions and interior insertions, which is what the
//! [`SimilarityStrategy::BoundedLevenshtein`] option is for.

use strsim::levenshtein;

use super::normalizer::{normalize_dosage_for_comparison, normalize_dosage_units};
use crate::config::SimilarityStrategy;

/// Both signatures must be at least this long for the prefix rule.
const MIN_FUZZY_LEN: usize = 3;

/// Max length difference tolerated between two signatures.
const MAX_LEN_DIFF: usize = 2;

/// Share of equal positions needed over the shorter signature.
const POSITIONAL_RATIO: f64 = 0.8;

/// A signature must be at least this long to count as contained in another.
const MIN_CONTAINED_LEN: usize = 5;

/// Float slack for unit conversion (`0.007g * 1000`).
const UNIT_CONVERSION_EPSILON: f64 = 1e-9;

/// Whether two letters-only signatures name the same drug.
pub fn names_are_similar(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let len_diff = longer.len() - shorter.len();

    if shorter.len() >= MIN_FUZZY_LEN && longer.starts_with(shorter) && len_diff <= MAX_LEN_DIFF {
        return true;
    }
    if len_diff > MAX_LEN_DIFF || shorter.is_empty() {
        return false;
    }

    let matches = a
        .bytes()
        .zip(b.bytes())
        .filter(|(x, y)| x == y)
        .count();
    matches as f64 / shorter.len() as f64 >= POSITIONAL_RATIO
}

/// Similarity under the configured strategy.
pub fn names_are_similar_with(strategy: SimilarityStrategy, a: &str, b: &str) -> bool {
    match strategy {
        SimilarityStrategy::Positional => names_are_similar(a, b),
        SimilarityStrategy::BoundedLevenshtein { max_distance } => {
            a == b
                || (a.len() >= MIN_FUZZY_LEN
                    && b.len() >= MIN_FUZZY_LEN
                    && levenshtein(a, b) <= max_distance)
        }
    }
}

/// Compare two dosages position by position within a relative tolerance.
///
/// `None` when either dosage is absent. Segments must agree in count and
/// canonical unit; order matters, so `"500mg/250mg"` does not match
/// `"250mg/500mg"`.
pub fn dosages_match(d1: Option<&str>, d2: Option<&str>, tolerance: f64) -> Option<bool> {
    let (d1, d2) = (d1?, d2?);
    let units1 = normalize_dosage_units(d1);
    let units2 = normalize_dosage_units(d2);

    if units1.len() != units2.len() {
        return Some(false);
    }

    Some(units1.iter().zip(&units2).all(|(u1, u2)| {
        if u1.unit != u2.unit {
            return false;
        }
        let avg = (u1.value + u2.value) / 2.0;
        avg == 0.0 || (u1.value - u2.value).abs() / avg <= tolerance
    }))
}

/// Whether a candidate signature names the same drug as the query signature.
///
/// With `allow_containment`, one signature containing the other also counts
/// when the contained one is long enough ("panadol" in "panadolextra").
/// An empty signature never matches.
pub fn signatures_match(
    strategy: SimilarityStrategy,
    query: &str,
    candidate: &str,
    allow_containment: bool,
) -> bool {
    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    if names_are_similar_with(strategy, query, candidate) {
        return true;
    }
    allow_containment
        && ((candidate.len() >= MIN_CONTAINED_LEN && query.contains(candidate))
            || (query.len() >= MIN_CONTAINED_LEN && candidate.contains(query)))
}

/// Whether two dosages are the same strength: equal keys, or equal values
/// once converted to canonical units (`2.5g` is `2500mg`). Nearby strengths
/// are different. False when either dosage is missing.
pub fn same_dosage(d1: Option<&str>, d2: Option<&str>) -> bool {
    let key1 = d1.map(normalize_dosage_for_comparison).unwrap_or_default();
    let key2 = d2.map(normalize_dosage_for_comparison).unwrap_or_default();
    if key1.is_empty() || key2.is_empty() {
        return false;
    }
    key1 == key2 || dosages_match(d1, d2, UNIT_CONVERSION_EPSILON) == Some(true)
}
