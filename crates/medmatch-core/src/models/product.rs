//! Catalog and therapeutic-reference models.

use serde::{Deserialize, Serialize};

/// Image shown for a product synthesized from a reference entry without one.
pub const DEFAULT_IMAGE_URL: &str = "/images/medicine-placeholder.png";

/// Sale unit used when a reference entry does not carry one.
pub const DEFAULT_UNIT: &str = "box";

/// A product in the pharmacy catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Catalog identifier - unique
    pub id: String,
    /// Display name as stored in the catalog (e.g., "Paracetamol_500mg")
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: i64,
    /// Product image
    pub image_url: Option<String>,
    /// Sale unit (e.g., "box", "bottle")
    pub unit: Option<String>,
    /// Whether a prescription is required
    pub is_prescription: bool,
    /// Whether this product is currently sold
    pub active: bool,
}

impl Product {
    /// Create a new product with required fields.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            price: 0.0,
            stock: 0,
            image_url: None,
            unit: None,
            is_prescription: false,
            active: true,
        }
    }
}

/// An entry of the therapeutic reference collection.
///
/// Maps a drug name to its indication, therapeutic group and active
/// ingredient. Display fields are only used when no catalog product can be
/// found for the entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceEntry {
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

impl ReferenceEntry {
    /// Create a new reference entry with a generated id.
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            generic_name: None,
            indication: None,
            group_therapeutic: None,
            active_ingredient: None,
            price: None,
            stock: None,
            image_url: None,
            unit: None,
            is_prescription: None,
        }
    }

    /// Whether the entry carries any attribute other entries can be related by.
    pub fn has_therapeutic_attributes(&self) -> bool {
        [&self.indication, &self.group_therapeutic, &self.active_ingredient]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Build a stand-in product from this entry's own display fields.
    pub fn to_product(&self) -> Product {
        Product {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.indication.clone(),
            price: self.price.unwrap_or(0.0),
            stock: self.stock.unwrap_or(0),
            image_url: Some(
                self.image_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            ),
            unit: Some(self.unit.clone().unwrap_or_else(|| DEFAULT_UNIT.to_string())),
            is_prescription: self.is_prescription.unwrap_or(false),
            active: true,
        }
    }
}
