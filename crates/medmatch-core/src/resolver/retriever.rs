//! Tiered candidate retrieval.
//!
//! Patterns are tried in priority order (cleaned base name, then the raw
//! input, then first tokens), each as prefix and substring search, literal
//! and separator-tolerant. Results are concatenated in pattern order and
//! deduplicated by product id, because ranking downstream is first-match-wins.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::catalog::{CatalogQuery, LookupResult, MatchMode, ProductCatalog};
use crate::config::MatcherConfig;
use crate::models::{ParsedName, Product};

/// Patterns shorter than this are never searched.
const MIN_PATTERN_LEN: usize = 2;

/// The fallback first token must be longer than this.
const MIN_FALLBACK_TOKEN_LEN: usize = 2;

/// Counts lookups issued for one query and how many of them failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupTally {
    pub attempted: usize,
    pub failed: usize,
}

impl LookupTally {
    /// Unwrap a lookup result, logging and counting a failure as empty.
    pub fn record<T: Default>(&mut self, result: LookupResult<T>, what: &str) -> T {
        self.attempted += 1;
        match result {
            Ok(value) => value,
            Err(e) => {
                self.failed += 1;
                warn!(lookup = what, error = %e, "Lookup failed, skipping");
                T::default()
            }
        }
    }

    /// True when lookups were issued and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.failed == self.attempted
    }

    pub fn merge(&mut self, other: LookupTally) {
        self.attempted += other.attempted;
        self.failed += other.failed;
    }
}

/// Products kept in first-seen order, unique by id.
#[derive(Debug, Default)]
pub struct CandidateSet {
    seen: HashSet<String>,
    products: Vec<Product>,
}

impl CandidateSet {
    /// Add a product unless one with the same id is already present.
    pub fn insert(&mut self, product: Product) -> bool {
        if !self.seen.insert(product.id.clone()) {
            return false;
        }
        self.products.push(product);
        true
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn into_vec(self) -> Vec<Product> {
        self.products
    }
}

/// Candidates for one query plus the lookup outcome.
#[derive(Debug)]
pub struct Retrieval {
    pub candidates: Vec<Product>,
    pub tally: LookupTally,
}

/// Search patterns for a query, highest priority first, unique.
pub fn search_patterns(parsed: &ParsedName, original: &str) -> Vec<String> {
    let mut patterns = Vec::new();

    for source in [parsed.base_name.as_str(), original] {
        let words: Vec<&str> = source.split_whitespace().collect();
        patterns.push(words.join(" "));
        patterns.push(words.join("_"));
        patterns.push(words.concat());
        patterns.push(words.join("+"));
    }
    for source in [parsed.base_name.as_str(), original] {
        if let Some(token) = source.split_whitespace().next() {
            patterns.push(token.to_string());
        }
    }

    let mut seen = HashSet::new();
    patterns
        .into_iter()
        .filter(|p| p.chars().count() >= MIN_PATTERN_LEN)
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Queries for one pattern: literal then separator-tolerant, each as prefix
/// then substring. A pattern of bare separators gets only the literal pair.
fn pattern_queries(pattern: &str, limit: usize) -> Vec<CatalogQuery> {
    let literal = [MatchMode::Prefix, MatchMode::Substring]
        .map(|mode| Some(CatalogQuery::literal(pattern, mode)));
    let tolerant = [MatchMode::Prefix, MatchMode::Substring]
        .map(|mode| CatalogQuery::separator_tolerant(pattern, mode));

    literal
        .into_iter()
        .chain(tolerant)
        .flatten()
        .map(|query| query.with_limit(limit))
        .collect()
}

/// Retrieves candidate products for a parsed query.
pub struct CandidateRetriever<'a> {
    catalog: &'a dyn ProductCatalog,
    config: &'a MatcherConfig,
}

impl<'a> CandidateRetriever<'a> {
    pub fn new(catalog: &'a dyn ProductCatalog, config: &'a MatcherConfig) -> Self {
        Self { catalog, config }
    }

    /// Gather unique candidates for `parsed`, stopping once enough are found.
    pub fn retrieve(&self, parsed: &ParsedName, original: &str, max_per_pattern: usize) -> Retrieval {
        let target = self.config.candidate_target(max_per_pattern);
        let mut tally = LookupTally::default();
        let mut candidates = CandidateSet::default();
        let mut issued = HashSet::new();

        for pattern in search_patterns(parsed, original) {
            if candidates.len() >= target {
                break;
            }
            for query in pattern_queries(&pattern, max_per_pattern) {
                // "Zinc" literal and separator-tolerant are the same regex
                if !issued.insert(query.regex_source()) {
                    continue;
                }
                let found = tally.record(self.catalog.search(&query), "catalog pattern search");
                for product in found {
                    candidates.insert(product);
                }
            }
            debug!(pattern = %pattern, candidates = candidates.len(), "Pattern searched");
        }

        if candidates.len() < self.config.fallback_floor {
            if let Some(token) = parsed
                .first_token()
                .filter(|t| t.chars().count() > MIN_FALLBACK_TOKEN_LEN)
            {
                let query = CatalogQuery::literal(token, MatchMode::Prefix).with_limit(target);
                let found = tally.record(self.catalog.search(&query), "catalog fallback search");
                for product in found {
                    candidates.insert(product);
                }
                debug!(token = %token, candidates = candidates.len(), "Fallback tier searched");
            }
        }

        Retrieval {
            candidates: candidates.into_vec(),
            tally,
        }
    }
}
