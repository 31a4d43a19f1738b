//! Medicine name resolver.
//!
//! Pipeline: Parse → Retrieve candidates → Rank (exact match)
//!                                       → Tiered suggestions (similar medicines)

mod normalizer;
mod parser;
mod ranker;
mod retriever;
mod similar;
mod similarity;

pub use normalizer::*;
pub use parser::*;
pub use ranker::*;
pub use retriever::*;
pub use similar::*;
pub use similarity::*;

use thiserror::Error;
use tracing::{debug, info, info_span};

use crate::catalog::{ProductCatalog, TherapeuticReference};
use crate::config::{ConfigError, MatcherConfig};
use crate::db::Database;
use crate::models::{MatchResult, SimilarMatch};

/// Resolver errors.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Every lookup failed for {query:?} ({failures} failures)")]
    LookupFailed { query: String, failures: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Entry point for exact-match and similar-medicine lookups.
pub struct Resolver<'a> {
    catalog: &'a dyn ProductCatalog,
    reference: Option<&'a dyn TherapeuticReference>,
    config: MatcherConfig,
    ranker: MatchRanker,
}

impl<'a> Resolver<'a> {
    /// Resolver over a database serving as both catalog and reference.
    pub fn new(db: &'a Database) -> Self {
        Self::with_collaborators(db, Some(db))
    }

    /// Resolver over separate collaborators. Without a reference collection
    /// the therapeutic suggestion tiers are skipped.
    pub fn with_collaborators(
        catalog: &'a dyn ProductCatalog,
        reference: Option<&'a dyn TherapeuticReference>,
    ) -> Self {
        let config = MatcherConfig::default();
        Self {
            catalog,
            reference,
            ranker: MatchRanker::new(&config),
            config,
        }
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: MatcherConfig) -> ResolverResult<Self> {
        config.validate()?;
        self.ranker = MatchRanker::new(&config);
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Best catalog match for an OCR'd medicine name.
    ///
    /// `medicine_text` is searched when `medicine_name` is blank. `Ok(None)`
    /// means the search completed and nothing matched.
    pub fn find_exact_match(
        &self,
        medicine_name: &str,
        medicine_text: &str,
    ) -> ResolverResult<Option<MatchResult>> {
        let Some(raw) = query_text(medicine_name, medicine_text) else {
            return Ok(None);
        };
        let _span = info_span!("find_exact_match", query = %raw).entered();

        let parsed = parse_medicine_name(raw);
        let retrieval = CandidateRetriever::new(self.catalog, &self.config).retrieve(
            &parsed,
            raw,
            self.config.exact_per_pattern,
        );
        if retrieval.tally.all_failed() {
            return Err(lookup_failed(raw, retrieval.tally));
        }

        debug!(
            base_name = %parsed.base_name,
            dosage = ?parsed.dosage,
            candidates = retrieval.candidates.len(),
            "Candidates retrieved"
        );
        let result = self.ranker.rank(&retrieval.candidates, &parsed);
        match &result {
            Some(m) => info!(
                product_id = %m.product.id,
                match_type = m.match_type.as_str(),
                confidence = m.confidence,
                candidates = retrieval.candidates.len(),
                "Exact match resolved"
            ),
            None => info!(candidates = retrieval.candidates.len(), "No catalog match"),
        }
        Ok(result)
    }

    /// Resolve several names; one failure does not affect the others.
    pub fn find_exact_matches<S: AsRef<str>>(
        &self,
        medicine_names: &[S],
    ) -> Vec<ResolverResult<Option<MatchResult>>> {
        medicine_names
            .iter()
            .map(|name| self.find_exact_match(name.as_ref(), ""))
            .collect()
    }

    /// Up to `limit` related products, strongest relation first.
    pub fn find_similar_medicines(
        &self,
        medicine_name: &str,
        medicine_text: &str,
        limit: usize,
    ) -> ResolverResult<Vec<SimilarMatch>> {
        let Some(raw) = query_text(medicine_name, medicine_text) else {
            return Ok(Vec::new());
        };
        let _span = info_span!("find_similar_medicines", query = %raw, limit).entered();

        let finder = SimilarMedicineFinder::new(self.catalog, self.reference, &self.config);
        let (matches, tally) = finder.find(raw, limit);
        if tally.all_failed() {
            return Err(lookup_failed(raw, tally));
        }
        info!(
            found = matches.len(),
            failed_lookups = tally.failed,
            "Similar medicines resolved"
        );
        Ok(matches)
    }
}

/// The name when present, else the surrounding text.
fn query_text<'s>(medicine_name: &'s str, medicine_text: &'s str) -> Option<&'s str> {
    [medicine_name, medicine_text]
        .into_iter()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn lookup_failed(query: &str, tally: LookupTally) -> ResolverError {
    ResolverError::LookupFailed {
        query: query.to_string(),
        failures: tally.failed,
    }
}
