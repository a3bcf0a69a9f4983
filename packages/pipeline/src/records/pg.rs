//! Postgres-backed canonical record store.
//!
//! `replace_all` recreates the table inside one transaction, so a
//! failed load can never leave a partially written cohort behind.

use async_trait::async_trait;
use sqlx::PgPool;

use corpus::error::{PipelineError, Result};

use super::{CanonicalRecord, RecordField, RecordStore};

const CREATE_TABLE: &str = r#"
CREATE TABLE canonical_records (
    task_id            TEXT PRIMARY KEY,
    question           TEXT NOT NULL,
    level              TEXT NOT NULL,
    final_answer       TEXT NOT NULL,
    file_name          TEXT NOT NULL,
    source_partition   TEXT NOT NULL,
    annotator_metadata TEXT NOT NULL,
    raw_url            TEXT,
    file_extension     TEXT,
    markdown_url       TEXT,
    partition_url      TEXT
)
"#;

/// [`RecordStore`] over a Postgres pool.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(e: sqlx::Error) -> PipelineError {
    PipelineError::store_unavailable(e.to_string())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn replace_all(&self, records: &[CanonicalRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query("DROP TABLE IF EXISTS canonical_records")
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        sqlx::query(CREATE_TABLE)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO canonical_records
                    (task_id, question, level, final_answer, file_name,
                     source_partition, annotator_metadata)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&record.task_id)
            .bind(&record.question)
            .bind(&record.level)
            .bind(&record.final_answer)
            .bind(&record.file_name)
            .bind(&record.source_partition)
            .bind(&record.annotator_metadata)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)
    }

    async fn list_all(&self) -> Result<Vec<CanonicalRecord>> {
        sqlx::query_as::<_, CanonicalRecord>(
            "SELECT * FROM canonical_records ORDER BY task_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn update_field(&self, task_id: &str, field: RecordField, value: &str) -> Result<()> {
        // Column name comes from the closed RecordField enum, never
        // from caller input.
        let query = format!(
            "UPDATE canonical_records SET {} = $1 WHERE task_id = $2",
            field.column()
        );
        sqlx::query(&query)
            .bind(value)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn find_by_file_name(&self, file_name: &str) -> Result<Vec<CanonicalRecord>> {
        sqlx::query_as::<_, CanonicalRecord>(
            "SELECT * FROM canonical_records WHERE file_name = $1 ORDER BY task_id",
        )
        .bind(file_name)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }
}
