//! SQLite schema definition.

/// Complete database schema for medmatch.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Product Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS products (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL DEFAULT 0,
    stock INTEGER NOT NULL DEFAULT 0,
    image_url TEXT,
    unit TEXT,
    is_prescription INTEGER NOT NULL DEFAULT 0,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_products_name ON products(name);
CREATE INDEX IF NOT EXISTS idx_products_active ON products(active);

-- ============================================================================
-- Therapeutic Reference
-- ============================================================================

CREATE TABLE IF NOT EXISTS therapeutic_reference (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    generic_name TEXT,
    indication TEXT,
    group_therapeutic TEXT,
    active_ingredient TEXT,
    price REAL,
    stock INTEGER,
    image_url TEXT,
    unit TEXT,
    is_prescription INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_reference_indication ON therapeutic_reference(indication COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_reference_group ON therapeutic_reference(group_therapeutic COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_reference_ingredient ON therapeutic_reference(active_ingredient COLLATE NOCASE);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_product_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO products (id, name) VALUES (?, ?)",
            ["P001", "Paracetamol_500mg"],
        )
        .unwrap();

        let (active, stock): (bool, i64) = conn
            .query_row(
                "SELECT active, stock FROM products WHERE id = 'P001'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!(active);
        assert_eq!(stock, 0);
    }
}
