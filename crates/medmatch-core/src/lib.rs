//! MedMatch Core Library
//!
//! Resolves noisy, OCR'd medicine names to products in a pharmacy catalog.
//!
//! # Architecture
//!
//! ```text
//! "PARACETAMOL_500mg (1 hộp x 10 viên)"
//!                 │
//!                 ▼
//!           Name parsing ──────► base name "PARACETAMOL", dosage "500mg"
//!                 │
//!                 ▼
//!       Candidate retrieval  (prefix / substring, literal / separator-tolerant)
//!                 │
//!        ┌────────┴─────────────────────┐
//!        ▼                              ▼
//!   Match ranking                Similar medicines
//!   first match wins             same name → similar name →
//!   exact / name_only            same indication → reference collection
//! ```
//!
//! Confidence values are fixed per match branch, not continuous scores.
//!
//! # Modules
//!
//! - [`db`]: SQLite catalog and therapeutic reference with regex search
//! - [`models`]: Domain types (Product, ReferenceEntry, MatchResult, etc.)
//! - [`catalog`]: Collaborator traits the resolver searches through
//! - [`config`]: Retrieval budgets, similarity strategy
//! - [`resolver`]: Parser, normalizers, retrieval, ranking, suggestions

pub mod catalog;
pub mod config;
pub mod db;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use catalog::{CatalogQuery, LookupError, MatchMode, ProductCatalog, TherapeuticReference};
pub use config::{MatcherConfig, SimilarityStrategy};
pub use db::Database;
pub use models::{
    MatchReason, MatchResult, MatchType, ParsedName, Product, ReferenceEntry, SimilarMatch,
};
pub use resolver::{Resolver, ResolverError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedMatchError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<db::DbError> for MedMatchError {
    fn from(e: db::DbError) -> Self {
        MedMatchError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for MedMatchError {
    fn from(e: config::ConfigError) -> Self {
        MedMatchError::ConfigError(e.to_string())
    }
}

impl From<ResolverError> for MedMatchError {
    fn from(e: ResolverError) -> Self {
        match e {
            ResolverError::LookupFailed { .. } => MedMatchError::LookupFailed(e.to_string()),
            ResolverError::Config(inner) => inner.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedMatchError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedMatchError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Free Functions (exported to FFI)
// =========================================================================

/// Split a raw medicine name into base name and dosage.
#[uniffi::export]
pub fn parse_medicine_name(raw: String) -> FfiParsedName {
    resolver::parse_medicine_name(&raw).into()
}

/// Letters-only lowercase name signature.
#[uniffi::export]
pub fn normalize_for_comparison(name: String) -> String {
    resolver::normalize_for_comparison(&name)
}

/// Alphanumeric dosage key.
#[uniffi::export]
pub fn normalize_dosage_for_comparison(dosage: String) -> String {
    resolver::normalize_dosage_for_comparison(&dosage)
}

/// Install a global fmt subscriber filtered by `filter` (e.g. "medmatch_core=debug").
///
/// Calling again once a subscriber is installed does nothing.
#[uniffi::export]
pub fn init_logging(filter: String) -> Result<(), MedMatchError> {
    let filter =
        EnvFilter::try_new(&filter).map_err(|e| MedMatchError::InvalidInput(e.to_string()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    Ok(())
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedMatchCore>, MedMatchError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(MedMatchCore::new(db)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedMatchCore>, MedMatchError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MedMatchCore::new(db)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database and matcher configuration for FFI.
#[derive(uniffi::Object)]
pub struct MedMatchCore {
    db: Arc<Mutex<Database>>,
    config: Mutex<MatcherConfig>,
}

impl MedMatchCore {
    fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Mutex::new(MatcherConfig::default()),
        }
    }
}

#[uniffi::export]
impl MedMatchCore {
    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the matcher configuration from JSON. Missing fields take defaults.
    pub fn configure(&self, config_json: String) -> Result<(), MedMatchError> {
        let config = MatcherConfig::from_json_str(&config_json)?;
        *self.config.lock()? = config;
        Ok(())
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Add or update a catalog product.
    pub fn upsert_product(&self, product: FfiProduct) -> Result<(), MedMatchError> {
        let db = self.db.lock()?;
        db.upsert_product(&product.into())?;
        Ok(())
    }

    /// Get a catalog product by id.
    pub fn get_product(&self, id: String) -> Result<Option<FfiProduct>, MedMatchError> {
        let db = self.db.lock()?;
        let product = db.get_product(&id)?;
        Ok(product.map(|p| p.into()))
    }

    /// Add or update a therapeutic reference entry.
    pub fn upsert_reference_entry(&self, entry: FfiReferenceEntry) -> Result<(), MedMatchError> {
        let db = self.db.lock()?;
        db.upsert_reference_entry(&entry.into())?;
        Ok(())
    }

    // =========================================================================
    // Resolver Operations
    // =========================================================================

    /// Best catalog match for an OCR'd medicine name.
    pub fn find_exact_match(
        &self,
        medicine_name: String,
        medicine_text: String,
    ) -> Result<Option<FfiMatchResult>, MedMatchError> {
        let config = self.config.lock()?.clone();
        let db = self.db.lock()?;
        let resolver = Resolver::new(&db).with_config(config)?;

        let result = resolver.find_exact_match(&medicine_name, &medicine_text)?;
        Ok(result.map(|r| r.into()))
    }

    /// Up to `limit` related products, strongest relation first.
    pub fn find_similar_medicines(
        &self,
        medicine_name: String,
        medicine_text: String,
        limit: u32,
    ) -> Result<Vec<FfiSimilarMatch>, MedMatchError> {
        let config = self.config.lock()?.clone();
        let db = self.db.lock()?;
        let resolver = Resolver::new(&db).with_config(config)?;

        let matches =
            resolver.find_similar_medicines(&medicine_name, &medicine_text, limit as usize)?;
        Ok(matches.into_iter().map(|m| m.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe catalog product.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub image_url: Option<String>,
    pub unit: Option<String>,
    pub is_prescription: bool,
    pub active: bool,
}

impl From<Product> for FfiProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image_url: product.image_url,
            unit: product.unit,
            is_prescription: product.is_prescription,
            active: product.active,
        }
    }
}

impl From<FfiProduct> for Product {
    fn from(product: FfiProduct) -> Self {
        Product {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image_url: product.image_url,
            unit: product.unit,
            is_prescription: product.is_prescription,
            active: product.active,
        }
    }
}

/// FFI-safe therapeutic reference entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceEntry {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub indication: Option<String>,
    pub group_therapeutic: Option<String>,
    pub active_ingredient: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub unit: Option<String>,
    pub is_prescription: Option<bool>,
}

impl From<FfiReferenceEntry> for ReferenceEntry {
    fn from(entry: FfiReferenceEntry) -> Self {
        ReferenceEntry {
            id: entry.id,
            name: entry.name,
            generic_name: entry.generic_name,
            indication: entry.indication,
            group_therapeutic: entry.group_therapeutic,
            active_ingredient: entry.active_ingredient,
            price: entry.price,
            stock: entry.stock,
            image_url: entry.image_url,
            unit: entry.unit,
            is_prescription: entry.is_prescription,
        }
    }
}

/// FFI-safe parse result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiParsedName {
    pub base_name: String,
    pub dosage: Option<String>,
}

impl From<ParsedName> for FfiParsedName {
    fn from(parsed: ParsedName) -> Self {
        Self {
            base_name: parsed.base_name,
            dosage: parsed.dosage,
        }
    }
}

/// FFI-safe exact-match result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMatchResult {
    pub product: FfiProduct,
    /// "exact" or "name_only"
    pub match_type: String,
    pub confidence: f64,
}

impl From<MatchResult> for FfiMatchResult {
    fn from(result: MatchResult) -> Self {
        Self {
            product: result.product.into(),
            match_type: result.match_type.as_str().to_string(),
            confidence: result.confidence,
        }
    }
}

/// FFI-safe similar-medicine suggestion.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSimilarMatch {
    pub product: FfiProduct,
    pub match_reason: String,
    pub confidence: f64,
    pub in_catalog: bool,
}

impl From<SimilarMatch> for FfiSimilarMatch {
    fn from(m: SimilarMatch) -> Self {
        Self {
            product: m.product.into(),
            match_reason: m.match_reason.as_str().to_string(),
            confidence: m.confidence,
            in_catalog: m.in_catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_product(id: &str, name: &str) -> FfiProduct {
        Product::new(id.into(), name.into()).into()
    }

    #[test]
    fn test_ffi_round_trip_product() {
        let core = open_database_in_memory().unwrap();
        core.upsert_product(ffi_product("P001", "Paracetamol_500mg"))
            .unwrap();

        let product = core.get_product("P001".into()).unwrap().unwrap();
        assert_eq!(product.name, "Paracetamol_500mg");
        assert!(core.get_product("P999".into()).unwrap().is_none());
    }

    #[test]
    fn test_ffi_find_exact_match() {
        let core = open_database_in_memory().unwrap();
        core.upsert_product(ffi_product("P001", "Paracetamol_250mg"))
            .unwrap();

        let result = core
            .find_exact_match("Paracetamol 500mg".into(), String::new())
            .unwrap()
            .unwrap();
        assert_eq!(result.match_type, "name_only");
        assert_eq!(result.confidence, 0.80);
    }

    #[test]
    fn test_ffi_find_similar_synthesizes_reference_entries() {
        let core = open_database_in_memory().unwrap();
        core.upsert_reference_entry(FfiReferenceEntry {
            id: "R1".into(),
            name: "Panadol".into(),
            generic_name: Some("Paracetamol".into()),
            indication: None,
            group_therapeutic: None,
            active_ingredient: None,
            price: Some(12_000.0),
            stock: None,
            image_url: None,
            unit: None,
            is_prescription: None,
        })
        .unwrap();

        let matches = core
            .find_similar_medicines("Panadol 500mg".into(), String::new(), 5)
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_reason, "from_reference_collection");
        assert!(!matches[0].in_catalog);
        assert_eq!(matches[0].product.price, 12_000.0);
        assert_eq!(matches[0].product.unit.as_deref(), Some(models::DEFAULT_UNIT));
    }

    #[test]
    fn test_ffi_configure() {
        let core = open_database_in_memory().unwrap();
        core.configure(r#"{"similarity": {"kind": "bounded_levenshtein", "max_distance": 2}}"#.into())
            .unwrap();

        assert!(matches!(
            core.configure(r#"{"candidate_multiplier": 0}"#.into()),
            Err(MedMatchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_ffi_free_functions() {
        let parsed = parse_medicine_name("SIMETHICON_B_80mg".into());
        assert_eq!(parsed.base_name, "SIMETHICON B");
        assert_eq!(parsed.dosage.as_deref(), Some("80mg"));

        assert_eq!(normalize_for_comparison("SIMETHICON B".into()), "simethiconb");
        assert_eq!(normalize_dosage_for_comparison("2500mg+500mg".into()), "2500mg500mg");
    }

    #[test]
    fn test_init_logging() {
        assert!(init_logging("medmatch_core=debug".into()).is_ok());
        // Second install is a no-op
        assert!(init_logging("info".into()).is_ok());
        assert!(init_logging("medmatch_core=notalevel".into()).is_err());
    }
}
