//! Related-product suggestions.
//!
//! Tiers run in order until `limit` suggestions are collected:
//!
//! 1. Same name, same dosage
//! 2. Same name, different dosage
//! 3. First token as a name/description substring
//! 4. Reference entries sharing an indication, group or ingredient
//! 5. Reference entries by name, synthesized when not in the catalog
//!
//! Each tier only appends, so earlier tiers always rank first.

use std::collections::HashSet;

use tracing::debug;

use super::normalizer::normalize_for_comparison;
use super::parser::parse_medicine_name;
use super::retriever::{CandidateRetriever, LookupTally};
use super::similarity::{same_dosage, signatures_match};
use crate::catalog::{CatalogQuery, MatchMode, ProductCatalog, SearchFields, TherapeuticReference};
use crate::config::MatcherConfig;
use crate::models::{MatchReason, ParsedName, Product, ReferenceEntry, SimilarMatch};

pub const SAME_NAME_SAME_DOSAGE_CONFIDENCE: f64 = 0.90;
pub const SAME_NAME_DIFFERENT_DOSAGE_CONFIDENCE: f64 = 0.75;
pub const SIMILAR_NAME_CONFIDENCE: f64 = 0.6;
pub const SAME_INDICATION_SAME_DOSAGE_CONFIDENCE: f64 = 0.85;
pub const SAME_INDICATION_DIFFERENT_DOSAGE_CONFIDENCE: f64 = 0.70;
pub const FROM_REFERENCE_CONFIDENCE: f64 = 0.65;

/// Suggestions collected so far, unique and capped at `limit`.
struct Suggestions {
    limit: usize,
    seen: HashSet<String>,
    matches: Vec<SimilarMatch>,
}

impl Suggestions {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            matches: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.matches.len() >= self.limit
    }

    /// Catalog products are keyed by id, synthesized ones by name signature.
    fn push(&mut self, product: Product, reason: MatchReason, confidence: f64, in_catalog: bool) {
        if self.is_full() {
            return;
        }
        let key = if in_catalog {
            format!("id:{}", product.id)
        } else {
            format!("name:{}", normalize_for_comparison(&product.name))
        };
        if !self.seen.insert(key) {
            return;
        }
        self.matches.push(SimilarMatch {
            product,
            match_reason: reason,
            confidence,
            in_catalog,
        });
    }

    fn extend(&mut self, products: Vec<Product>, reason: MatchReason, confidence: f64) {
        for product in products {
            self.push(product, reason, confidence, true);
        }
    }
}

/// Finds products related to a query across the catalog and the
/// therapeutic reference.
pub struct SimilarMedicineFinder<'a> {
    catalog: &'a dyn ProductCatalog,
    reference: Option<&'a dyn TherapeuticReference>,
    config: &'a MatcherConfig,
}

impl<'a> SimilarMedicineFinder<'a> {
    pub fn new(
        catalog: &'a dyn ProductCatalog,
        reference: Option<&'a dyn TherapeuticReference>,
        config: &'a MatcherConfig,
    ) -> Self {
        Self {
            catalog,
            reference,
            config,
        }
    }

    /// Up to `limit` suggestions for `raw`, plus the lookup tally.
    pub fn find(&self, raw: &str, limit: usize) -> (Vec<SimilarMatch>, LookupTally) {
        let mut tally = LookupTally::default();
        if limit == 0 || raw.trim().is_empty() {
            return (Vec::new(), tally);
        }

        let parsed = parse_medicine_name(raw);
        let mut suggestions = Suggestions::new(limit);
        let budget = limit.saturating_mul(self.config.similar_budget_multiplier);

        self.same_name_tier(&parsed, raw, budget, &mut suggestions, &mut tally);

        let first_token = parsed.first_token();
        if let Some(token) = first_token {
            if !suggestions.is_full() {
                self.similar_name_tier(token, budget, &mut suggestions, &mut tally);
            }
            if let Some(reference) = self.reference {
                if !suggestions.is_full() {
                    self.shared_attribute_tier(reference, token, &parsed, &mut suggestions, &mut tally);
                }
                if !suggestions.is_full() {
                    self.reference_name_tier(reference, token, &mut suggestions, &mut tally);
                }
            }
        }

        debug!(
            query = %raw,
            found = suggestions.matches.len(),
            failed_lookups = tally.failed,
            "Similar medicines collected"
        );
        (suggestions.matches, tally)
    }

    /// Catalog products whose name matches, same dosage first.
    fn same_name_tier(
        &self,
        parsed: &ParsedName,
        raw: &str,
        budget: usize,
        suggestions: &mut Suggestions,
        tally: &mut LookupTally,
    ) {
        let retrieval = CandidateRetriever::new(self.catalog, self.config).retrieve(parsed, raw, budget);
        tally.merge(retrieval.tally);

        let query_signature = normalize_for_comparison(&parsed.base_name);
        let (mut same, mut different) = (Vec::new(), Vec::new());

        for product in retrieval.candidates {
            let candidate = parse_medicine_name(&product.name);
            let signature = normalize_for_comparison(&candidate.base_name);
            if !signatures_match(self.config.similarity, &query_signature, &signature, false) {
                continue;
            }
            if same_dosage(parsed.dosage.as_deref(), candidate.dosage.as_deref()) {
                same.push(product);
            } else {
                different.push(product);
            }
        }

        suggestions.extend(
            same,
            MatchReason::SameNameSameDosage,
            SAME_NAME_SAME_DOSAGE_CONFIDENCE,
        );
        suggestions.extend(
            different,
            MatchReason::SameNameDifferentDosage,
            SAME_NAME_DIFFERENT_DOSAGE_CONFIDENCE,
        );
    }

    /// Products mentioning the first token whose name starts with it.
    fn similar_name_tier(
        &self,
        token: &str,
        budget: usize,
        suggestions: &mut Suggestions,
        tally: &mut LookupTally,
    ) {
        let token_signature = normalize_for_comparison(token);
        if token_signature.is_empty() {
            return;
        }

        let query = CatalogQuery::literal(token, MatchMode::Substring)
            .with_fields(SearchFields::NameOrDescription)
            .with_limit(budget);
        let found = tally.record(self.catalog.search(&query), "similar name search");

        for product in found {
            let signature = normalize_for_comparison(&parse_medicine_name(&product.name).base_name);
            if signature.starts_with(&token_signature) {
                suggestions.push(product, MatchReason::SimilarName, SIMILAR_NAME_CONFIDENCE, true);
            }
        }
    }

    /// Catalog products for reference entries related to the query's entry.
    fn shared_attribute_tier(
        &self,
        reference: &dyn TherapeuticReference,
        token: &str,
        parsed: &ParsedName,
        suggestions: &mut Suggestions,
        tally: &mut LookupTally,
    ) {
        let entry = tally.record(reference.find_by_name_prefix(token), "reference entry lookup");
        let Some(entry) = entry.filter(ReferenceEntry::has_therapeutic_attributes) else {
            return;
        };

        let related = tally.record(
            reference.find_by_shared_attributes(
                entry.indication.as_deref(),
                entry.group_therapeutic.as_deref(),
                entry.active_ingredient.as_deref(),
                &entry.id,
                self.config.reference_lookup_limit,
            ),
            "related reference lookup",
        );

        let (mut same, mut different) = (Vec::new(), Vec::new());
        for related_entry in &related {
            let Some(product) = self.resolve_in_catalog(related_entry, tally) else {
                continue;
            };
            let dosage = parse_medicine_name(&product.name).dosage;
            if same_dosage(parsed.dosage.as_deref(), dosage.as_deref()) {
                same.push(product);
            } else {
                different.push(product);
            }
        }

        suggestions.extend(
            same,
            MatchReason::SameIndicationSameDosage,
            SAME_INDICATION_SAME_DOSAGE_CONFIDENCE,
        );
        suggestions.extend(
            different,
            MatchReason::SameIndicationDifferentDosage,
            SAME_INDICATION_DIFFERENT_DOSAGE_CONFIDENCE,
        );
    }

    /// Reference entries named like the token, as catalog products when
    /// available and synthesized otherwise.
    fn reference_name_tier(
        &self,
        reference: &dyn TherapeuticReference,
        token: &str,
        suggestions: &mut Suggestions,
        tally: &mut LookupTally,
    ) {
        let entries = tally.record(
            reference.search_by_name(token, self.config.reference_lookup_limit),
            "reference name search",
        );

        for entry in entries {
            if suggestions.is_full() {
                break;
            }
            match self.resolve_in_catalog(&entry, tally) {
                Some(product) => suggestions.push(
                    product,
                    MatchReason::FromReferenceCollection,
                    FROM_REFERENCE_CONFIDENCE,
                    true,
                ),
                None => suggestions.push(
                    entry.to_product(),
                    MatchReason::FromReferenceCollection,
                    FROM_REFERENCE_CONFIDENCE,
                    false,
                ),
            }
        }
    }

    /// First catalog product whose name or description carries the entry's
    /// base name.
    fn resolve_in_catalog(&self, entry: &ReferenceEntry, tally: &mut LookupTally) -> Option<Product> {
        let base_name = parse_medicine_name(&entry.name).base_name;
        if normalize_for_comparison(&base_name).is_empty() {
            return None;
        }

        let query = CatalogQuery::separator_tolerant(&base_name, MatchMode::Substring)?
            .with_fields(SearchFields::NameOrDescription)
            .with_limit(1);
        tally
            .record(self.catalog.search(&query), "reference catalog lookup")
            .into_iter()
            .next()
    }
}
