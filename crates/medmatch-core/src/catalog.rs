//! Collaborator interfaces consumed by the resolver.
//!
//! The product catalog and the therapeutic reference collection are owned by
//! other subsystems. The resolver only needs pattern search over them, so both
//! are traits here; [`crate::db::Database`] implements them on SQLite.

use thiserror::Error;

use crate::db::DbError;
use crate::models::{Product, ReferenceEntry};

/// Collaborator lookup errors.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Lookup unavailable: {0}")]
    Unavailable(String),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Whether a pattern must match at the start of the field or anywhere in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Prefix,
    Substring,
}

/// Text fields a catalog search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFields {
    Name,
    NameOrDescription,
}

/// Characters treated as interchangeable word separators in product names.
const SEPARATOR_CLASS: &str = r"[\s_+]+";

/// A single catalog search request.
///
/// `expression` is a regex fragment in which every character taken from user
/// input is already escaped. Build queries with [`CatalogQuery::literal`] or
/// [`CatalogQuery::separator_tolerant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub expression: String,
    pub mode: MatchMode,
    pub case_insensitive: bool,
    pub fields: SearchFields,
    pub limit: usize,
}

impl CatalogQuery {
    /// Match `text` literally.
    pub fn literal(text: &str, mode: MatchMode) -> Self {
        Self::from_expression(regex::escape(text), mode)
    }

    /// Match `text` with every run of space/`_`/`+` accepting any run of those
    /// characters, so "VITAMIN C" also finds "VITAMIN_C" and "VITAMIN+C".
    ///
    /// `None` when `text` is nothing but separators; the empty expression
    /// would match every product.
    pub fn separator_tolerant(text: &str, mode: MatchMode) -> Option<Self> {
        let pieces: Vec<String> = text
            .split(|c: char| c.is_whitespace() || c == '_' || c == '+')
            .filter(|piece| !piece.is_empty())
            .map(regex::escape)
            .collect();
        if pieces.is_empty() {
            return None;
        }
        Some(Self::from_expression(pieces.join(SEPARATOR_CLASS), mode))
    }

    fn from_expression(expression: String, mode: MatchMode) -> Self {
        Self {
            expression,
            mode,
            case_insensitive: true,
            fields: SearchFields::Name,
            limit: 10,
        }
    }

    pub fn with_fields(mut self, fields: SearchFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Full regex source including case flag and anchor.
    pub fn regex_source(&self) -> String {
        let flags = if self.case_insensitive { "(?i)" } else { "" };
        let anchor = match self.mode {
            MatchMode::Prefix => "^",
            MatchMode::Substring => "",
        };
        format!("{}{}{}", flags, anchor, self.expression)
    }
}

/// Read-only product catalog with pattern search.
pub trait ProductCatalog {
    /// Search products matching `query`, in stable catalog order.
    fn search(&self, query: &CatalogQuery) -> LookupResult<Vec<Product>>;
}

/// Secondary collection relating drugs by indication, group and ingredient.
pub trait TherapeuticReference {
    /// First entry whose name or generic name starts with `token`, falling
    /// back to one that contains it.
    fn find_by_name_prefix(&self, token: &str) -> LookupResult<Option<ReferenceEntry>>;

    /// Entries sharing any of the given attributes, excluding `exclude_id`.
    fn find_by_shared_attributes(
        &self,
        indication: Option<&str>,
        group_therapeutic: Option<&str>,
        active_ingredient: Option<&str>,
        exclude_id: &str,
        limit: usize,
    ) -> LookupResult<Vec<ReferenceEntry>>;

    /// Entries whose name or generic name contains `token`.
    fn search_by_name(&self, token: &str, limit: usize) -> LookupResult<Vec<ReferenceEntry>>;
}
