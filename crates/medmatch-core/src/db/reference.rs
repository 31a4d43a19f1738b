//! Therapeutic reference database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::catalog::{CatalogQuery, LookupResult, MatchMode, TherapeuticReference};
use crate::models::ReferenceEntry;

const REFERENCE_COLUMNS: &str = "id, name, generic_name, indication, group_therapeutic, \
     active_ingredient, price, stock, image_url, unit, is_prescription";

impl Database {
    /// Insert or update a reference entry.
    pub fn upsert_reference_entry(&self, entry: &ReferenceEntry) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO therapeutic_reference (
                id, name, generic_name, indication, group_therapeutic, active_ingredient,
                price, stock, image_url, unit, is_prescription, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                generic_name = excluded.generic_name,
                indication = excluded.indication,
                group_therapeutic = excluded.group_therapeutic,
                active_ingredient = excluded.active_ingredient,
                price = excluded.price,
                stock = excluded.stock,
                image_url = excluded.image_url,
                unit = excluded.unit,
                is_prescription = excluded.is_prescription,
                updated_at = datetime('now')
            "#,
            params![
                entry.id,
                entry.name,
                entry.generic_name,
                entry.indication,
                entry.group_therapeutic,
                entry.active_ingredient,
                entry.price,
                entry.stock,
                entry.image_url,
                entry.unit,
                entry.is_prescription,
            ],
        )?;
        Ok(())
    }

    /// Get a reference entry by id.
    pub fn get_reference_entry(&self, id: &str) -> DbResult<Option<ReferenceEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM therapeutic_reference WHERE id = ?",
                    REFERENCE_COLUMNS
                ),
                [id],
                reference_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Entries whose name or generic name match `query`, in insertion order.
    fn search_reference_names(&self, query: &CatalogQuery) -> DbResult<Vec<ReferenceEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM therapeutic_reference
            WHERE regexp(?1, name) OR regexp(?1, COALESCE(generic_name, ''))
            ORDER BY rowid
            LIMIT ?2
            "#,
            REFERENCE_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![query.regex_source(), query.limit as i64],
            reference_from_row,
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Entries sharing an indication, therapeutic group or active ingredient.
    pub fn find_related_reference_entries(
        &self,
        indication: Option<&str>,
        group_therapeutic: Option<&str>,
        active_ingredient: Option<&str>,
        exclude_id: &str,
        limit: usize,
    ) -> DbResult<Vec<ReferenceEntry>> {
        let present = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM therapeutic_reference
            WHERE id != ?4
            AND (
                (?1 IS NOT NULL AND indication = ?1 COLLATE NOCASE)
                OR (?2 IS NOT NULL AND group_therapeutic = ?2 COLLATE NOCASE)
                OR (?3 IS NOT NULL AND active_ingredient = ?3 COLLATE NOCASE)
            )
            ORDER BY rowid
            LIMIT ?5
            "#,
            REFERENCE_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![
                present(indication),
                present(group_therapeutic),
                present(active_ingredient),
                exclude_id,
                limit as i64
            ],
            reference_from_row,
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

impl TherapeuticReference for Database {
    fn find_by_name_prefix(&self, token: &str) -> LookupResult<Option<ReferenceEntry>> {
        if token.trim().is_empty() {
            return Ok(None);
        }

        for mode in [MatchMode::Prefix, MatchMode::Substring] {
            let query = CatalogQuery::literal(token.trim(), mode).with_limit(1);
            if let Some(entry) = self.search_reference_names(&query)?.into_iter().next() {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn find_by_shared_attributes(
        &self,
        indication: Option<&str>,
        group_therapeutic: Option<&str>,
        active_ingredient: Option<&str>,
        exclude_id: &str,
        limit: usize,
    ) -> LookupResult<Vec<ReferenceEntry>> {
        Ok(self.find_related_reference_entries(
            indication,
            group_therapeutic,
            active_ingredient,
            exclude_id,
            limit,
        )?)
    }

    fn search_by_name(&self, token: &str, limit: usize) -> LookupResult<Vec<ReferenceEntry>> {
        if token.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = CatalogQuery::literal(token.trim(), MatchMode::Substring).with_limit(limit);
        Ok(self.search_reference_names(&query)?)
    }
}

fn reference_from_row(row: &Row<'_>) -> rusqlite::Result<ReferenceEntry> {
    Ok(ReferenceEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        generic_name: row.get(2)?,
        indication: row.get(3)?,
        group_therapeutic: row.get(4)?,
        active_ingredient: row.get(5)?,
        price: row.get(6)?,
        stock: row.get(7)?,
        image_url: row.get(8)?,
        unit: row.get(9)?,
        is_prescription: row.get(10)?,
    })
}
