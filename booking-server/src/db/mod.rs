//! Database Module
//!
//! 嵌入式 SurrealDB 存储。表结构宽松 (SCHEMALESS)，唯一性与查询
//! 性能由索引保证：`booking_number` 唯一索引即预约号的存储层约束。

pub mod models;
pub mod repository;

use std::path::Path;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

use crate::utils::AppError;

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database under `db_path` and apply definitions
    pub async fn new(db_path: &Path) -> Result<Self, AppError> {
        let db: Surreal<Db> = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("clearview")
            .use_db("booking")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        Self::define_schema(&db).await?;

        tracing::info!("Database ready (SurrealDB embedded, RocksDB backend)");

        Ok(Self { db })
    }

    /// Table and index definitions
    ///
    /// Re-running these on startup is harmless; SurrealDB treats them as
    /// idempotent with OVERWRITE.
    async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
        let definitions = r#"
            DEFINE TABLE OVERWRITE booking SCHEMALESS;
            DEFINE INDEX OVERWRITE uniq_booking_number ON booking FIELDS booking_number UNIQUE;
            DEFINE INDEX OVERWRITE idx_booking_date ON booking FIELDS appointment.date;
            DEFINE INDEX OVERWRITE idx_booking_status ON booking FIELDS status;

            DEFINE TABLE OVERWRITE blocked_slot SCHEMALESS;
            DEFINE INDEX OVERWRITE idx_blocked_date ON blocked_slot FIELDS date;

            DEFINE TABLE OVERWRITE contact SCHEMALESS;
            DEFINE INDEX OVERWRITE idx_contact_status ON contact FIELDS status;
        "#;

        db.query(definitions)
            .await
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
        Ok(())
    }
}
