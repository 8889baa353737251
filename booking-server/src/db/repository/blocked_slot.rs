//! Blocked Slot Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, parse_record_id};
use crate::db::models::BlockedSlot;

const TABLE: &str = "blocked_slot";

#[derive(Clone)]
pub struct BlockedSlotRepository {
    base: BaseRepository,
}

impl BlockedSlotRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a block. No overlap validation: multiple blocks for the same
    /// slot are permitted, availability checks presence only.
    pub async fn create(&self, block: BlockedSlot) -> RepoResult<BlockedSlot> {
        let created: Option<BlockedSlot> = self.base.db().create(TABLE).content(block).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create blocked slot".to_string()))
    }

    /// All blocks covering one calendar day
    pub async fn find_for_date(&self, date: &str) -> RepoResult<Vec<BlockedSlot>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM blocked_slot WHERE date = $date")
            .bind(("date", date.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Delete a block. Deleting a missing id succeeds; the caller cannot
    /// tell the difference and does not need to.
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let record = parse_record_id(TABLE, id)?;
        let _deleted: Option<BlockedSlot> = self.base.db().delete(record).await?;
        Ok(())
    }
}
