use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::models::{CatalogEntry, ImageRecord, RECORD_COLUMNS};

const CREATE_IMAGES_TABLE: &str = "CREATE TABLE IF NOT EXISTS images (\
    image_id TEXT PRIMARY KEY,\
    image_path TEXT,\
    image_thumbnail TEXT,\
    image_type TEXT,\
    style_name TEXT,\
    composition_structure TEXT,\
    color_palette TEXT,\
    lighting TEXT,\
    texture_finish TEXT,\
    geometry_flow TEXT,\
    primary_emotional_tone TEXT,\
    emotional_keyword_tags TEXT,\
    narrative_metaphor TEXT,\
    ai_generation_prompt TEXT,\
    recreation_guidelines TEXT,\
    recommended_use_cases TEXT\
);";

fn upsert_statement() -> String {
    let columns = RECORD_COLUMNS.join(", ");
    let placeholders = vec!["?"; RECORD_COLUMNS.len()].join(", ");
    let updates = RECORD_COLUMNS
        .iter()
        .skip(1)
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO images ({columns}) VALUES ({placeholders}) \
         ON CONFLICT(image_id) DO UPDATE SET {updates}"
    )
}

fn select_record_statement() -> String {
    let columns = RECORD_COLUMNS
        .iter()
        .map(|column| format!("COALESCE({column}, '') AS {column}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM images WHERE image_id = ?")
}

/// Single-table store for catalog records.
///
/// Writes go straight to SQLite on the caller's task; concurrent writers are
/// not coordinated and the last upsert for an `image_id` wins.
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl CatalogStore {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open catalog database {}", path.display()))?;

        debug!("Opened catalog database at {}", path.display());
        Ok(CatalogStore {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_IMAGES_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create images table")?;
        info!("Catalog table ready at {}", self.path.display());
        Ok(())
    }

    async fn table_exists(&self) -> Result<bool> {
        let found: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'images'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn upsert(&self, record: &ImageRecord) -> Result<()> {
        let statement = upsert_statement();
        let mut query = sqlx::query(&statement);
        for column in RECORD_COLUMNS {
            query = query.bind(record.field(column).unwrap_or_default().to_string());
        }
        query
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to save image '{}'", record.image_id))?;
        info!("Saved catalog record image_id={}", record.image_id);
        Ok(())
    }

    pub async fn get(&self, image_id: &str) -> Result<Option<ImageRecord>> {
        if !self.table_exists().await? {
            return Ok(None);
        }
        let statement = select_record_statement();
        let record = sqlx::query_as::<_, ImageRecord>(&statement)
            .bind(image_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read image '{image_id}'"))?;
        Ok(record)
    }

    /// Projection of every row. A store whose table was never created reads
    /// as empty.
    pub async fn list_all(&self) -> Result<Vec<CatalogEntry>> {
        if !self.table_exists().await? {
            debug!("images table absent; returning empty catalog");
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CatalogEntry>(
            "SELECT image_id, style_name, image_type, image_path FROM images",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list catalog")?;
        Ok(rows)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(image_id: &str, style_name: &str) -> ImageRecord {
        let mut record = ImageRecord::default();
        for column in RECORD_COLUMNS {
            *record.field_mut(column).unwrap() = format!("{column} of {image_id}");
        }
        record.image_id = image_id.to_string();
        record.style_name = style_name.to_string();
        record
    }

    async fn open_store(dir: &TempDir) -> CatalogStore {
        CatalogStore::open(&dir.path().join("nested").join("catalog.db"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_all_on_uninitialized_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.get("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips_all_fields() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.ensure_schema().await.unwrap();

        let record = sample("AI-001", "Dreamcore");
        store.upsert(&record).await.unwrap();

        let loaded = store.get("AI-001").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn ensure_schema_twice_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.ensure_schema().await.unwrap();
        store.upsert(&sample("AI-001", "Dreamcore")).await.unwrap();
        store.ensure_schema().await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_with_same_id_replaces_row() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.ensure_schema().await.unwrap();

        store.upsert(&sample("IMG-2", "Vaporwave")).await.unwrap();
        let second = sample("IMG-2", "Brutalist");
        store.upsert(&second).await.unwrap();

        let rows = store.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].style_name.as_deref(), Some("Brutalist"));
        assert_eq!(store.get("IMG-2").await.unwrap().unwrap(), second);
    }

    #[tokio::test]
    async fn list_all_projects_four_columns() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.ensure_schema().await.unwrap();
        store.upsert(&sample("A", "Minimal")).await.unwrap();
        store.upsert(&sample("B", "Baroque")).await.unwrap();

        let mut rows = store.list_all().await.unwrap();
        rows.sort_by(|a, b| a.image_id.cmp(&b.image_id));
        assert_eq!(
            rows[0],
            CatalogEntry {
                image_id: "A".to_string(),
                style_name: Some("Minimal".to_string()),
                image_type: Some("image_type of A".to_string()),
                image_path: Some("image_path of A".to_string()),
            }
        );
        assert_eq!(rows[1].image_id, "B");
    }

    #[tokio::test]
    async fn reopening_keeps_saved_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let store = CatalogStore::open(&path).await.unwrap();
            store.ensure_schema().await.unwrap();
            store.upsert(&sample("KEEP", "Art Deco")).await.unwrap();
            store.close().await;
        }
        let store = CatalogStore::open(&path).await.unwrap();
        assert_eq!(store.get("KEEP").await.unwrap().unwrap().style_name, "Art Deco");
    }

    #[test]
    fn upsert_statement_updates_every_non_key_column() {
        let statement = upsert_statement();
        assert!(statement.contains("ON CONFLICT(image_id) DO UPDATE SET"));
        assert_eq!(statement.matches("= excluded.").count(), 15);
        assert_eq!(statement.matches('?').count(), 16);
    }
}
