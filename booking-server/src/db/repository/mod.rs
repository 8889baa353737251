//! Repository Module
//!
//! Provides query/mutation access to the SurrealDB collections. All booking
//! mutations are targeted single-document updates; per-document atomicity is
//! the only isolation the storage layer offers.

pub mod blocked_slot;
pub mod booking;
pub mod contact;

// Re-exports
pub use blocked_slot::BlockedSlotRepository;
pub use booking::BookingRepository;
pub use contact::ContactRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

use crate::utils::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::not_found(msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - API 层传入 "booking:abc" 或裸 key "abc" 均可
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

/// Parse an API-supplied id into a RecordId for `table`
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<RecordId> {
    if id.contains(':') {
        let record: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid id format: {id}")))?;
        if record.table() != table {
            return Err(RepoError::Validation(format!(
                "Id {id} does not reference a {table}"
            )));
        }
        Ok(record)
    } else {
        Ok(RecordId::from_table_key(table, id))
    }
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Row shape for `SELECT count() ... GROUP ALL`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct CountRow {
    pub count: u64,
}

/// Row shape for `SELECT math::sum(..) AS total ... GROUP ALL`
#[derive(Debug, serde::Deserialize)]
pub(crate) struct SumRow {
    pub total: f64,
}
