//! Product catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::catalog::{CatalogQuery, LookupResult, ProductCatalog, SearchFields};
use crate::models::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, image_url, unit, is_prescription, active";

impl Database {
    /// Insert or update a product.
    pub fn upsert_product(&self, product: &Product) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO products (
                id, name, description, price, stock, image_url, unit,
                is_prescription, active, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                price = excluded.price,
                stock = excluded.stock,
                image_url = excluded.image_url,
                unit = excluded.unit,
                is_prescription = excluded.is_prescription,
                active = excluded.active,
                updated_at = datetime('now')
            "#,
            params![
                product.id,
                product.name,
                product.description,
                product.price,
                product.stock,
                product.image_url,
                product.unit,
                product.is_prescription,
                product.active,
            ],
        )?;
        Ok(())
    }

    /// Get a product by id.
    pub fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS),
                [id],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    /// List products in insertion order.
    pub fn list_products(&self, active_only: bool) -> DbResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM products WHERE (?1 = 0 OR active = 1) ORDER BY rowid",
            PRODUCT_COLUMNS
        ))?;
        let rows = stmt.query_map([active_only], product_from_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Mark a product as no longer sold (soft delete).
    pub fn deactivate_product(&self, id: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE products SET active = 0, updated_at = datetime('now') WHERE id = ?",
            [id],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Active products matching a catalog query, in insertion order.
    pub fn search_products(&self, query: &CatalogQuery) -> DbResult<Vec<Product>> {
        let include_description = query.fields == SearchFields::NameOrDescription;

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE active = 1
            AND (regexp(?1, name) OR (?2 AND regexp(?1, COALESCE(description, ''))))
            ORDER BY rowid
            LIMIT ?3
            "#,
            PRODUCT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![query.regex_source(), include_description, query.limit as i64],
            product_from_row,
        )?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }
}

impl ProductCatalog for Database {
    fn search(&self, query: &CatalogQuery) -> LookupResult<Vec<Product>> {
        Ok(self.search_products(query)?)
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        stock: row.get(4)?,
        image_url: row.get(5)?,
        unit: row.get(6)?,
        is_prescription: row.get(7)?,
        active: row.get(8)?,
    })
}
