//! Schema and style readers for both stores.
//!
//! Both stores are consumed through SQLite pools: the reference store is a
//! GeoPackage (a SQLite container with the `gpkg_contents` catalog and the
//! `layer_styles` style table), and the current store is a SQLite mirror of
//! the production catalog carrying the `INGEO_SEMTABLS` / `INGEO_STYLES`
//! tables. Every read is a short-lived scoped query against the pool.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::error::Result;

/// Reader for the reference GeoPackage.
pub struct ReferenceStore {
    pool: SqlitePool,
}

impl ReferenceStore {
    /// Creates a reader over an open pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists layer tables registered in the GeoPackage catalog, excluding
    /// the internal style-storage table.
    pub async fn table_names(&self, exclude: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT table_name FROM gpkg_contents")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(name,)| name)
            .filter(|name| name != exclude)
            .collect())
    }

    /// Returns the ordered column names of a table.
    pub async fn table_fields(&self, table: &str) -> Result<Vec<String>> {
        pragma_fields(&self.pool, table).await
    }

    /// Returns the raw QML style document for a table, if one is stored.
    pub async fn style_document(&self, table: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT styleQML FROM layer_styles WHERE f_table_name = ?")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(document,)| document))
    }
}

/// Reader for the current store mirror.
pub struct CurrentStore {
    pool: SqlitePool,
}

impl CurrentStore {
    /// Creates a reader over an open pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Lists tables carrying the given representation prefix, by name.
    pub async fn table_names(&self, prefix: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(name,)| name)
            .filter(|name| name.starts_with(prefix))
            .collect())
    }

    /// Returns the ordered column names of a table.
    pub async fn table_fields(&self, table: &str) -> Result<Vec<String>> {
        pragma_fields(&self.pool, table).await
    }

    /// Returns the raw inline style strings attached to a table.
    ///
    /// Two-step lookup through the catalog tables: the layer id mapped to
    /// the table name, then every style row for that layer id. A table
    /// without a catalog mapping has no styles.
    pub async fn style_strings(&self, table: &str) -> Result<Vec<String>> {
        let layer: Option<(String,)> =
            sqlx::query_as("SELECT LAYERID FROM INGEO_SEMTABLS WHERE TABLENAME = ?")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;
        let Some((layer_id,)) = layer else {
            return Ok(Vec::new());
        };
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT STYLENAME FROM INGEO_STYLES WHERE LAYERID = ?")
                .bind(&layer_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(style,)| style).collect())
    }
}

/// Reads column names via `PRAGMA table_info`, in declaration order.
async fn pragma_fields(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    // PRAGMA arguments cannot be bound; the table name comes from the
    // store's own catalog, quoted defensively all the same.
    let sql = format!("PRAGMA table_info('{}')", table.replace('\'', "''"));
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut fields = Vec::with_capacity(rows.len());
    for row in rows {
        fields.push(row.try_get::<String, _>("name")?);
    }
    Ok(fields)
}
