//! Contact Repository

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, parse_record_id};
use crate::db::models::{Contact, ContactResponse, ContactStatus};

const TABLE: &str = "contact";

#[derive(Clone)]
pub struct ContactRepository {
    base: BaseRepository,
}

impl ContactRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, contact: Contact) -> RepoResult<Contact> {
        let created: Option<Contact> = self.base.db().create(TABLE).content(contact).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create contact".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Contact>> {
        let record = parse_record_id(TABLE, id)?;
        let contact: Option<Contact> = self.base.db().select(record).await?;
        Ok(contact)
    }

    /// Paged listing, newest first, optional status filter
    pub async fn find_paged(
        &self,
        status: Option<ContactStatus>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<(Vec<Contact>, u64)> {
        let where_clause = if status.is_some() {
            " WHERE status = $status"
        } else {
            ""
        };
        let sql = format!(
            "SELECT * FROM contact{where_clause} ORDER BY created_at DESC \
             LIMIT $limit START $offset; \
             SELECT count() AS count FROM contact{where_clause} GROUP ALL;"
        );

        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("limit", limit as i64))
            .bind(("offset", offset as i64));
        if let Some(s) = status {
            query = query.bind(("status", s));
        }

        let mut result = query.await?;
        let contacts: Vec<Contact> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((contacts, total))
    }

    /// Update follow-up status and/or assignment
    pub async fn update(
        &self,
        id: &str,
        status: Option<ContactStatus>,
        assigned_to: Option<&str>,
        now_millis: i64,
    ) -> RepoResult<Contact> {
        let record = parse_record_id(TABLE, id)?;

        let mut assignments = vec!["updated_at = $now"];
        if status.is_some() {
            assignments.push("status = $status");
        }
        if assigned_to.is_some() {
            assignments.push("assigned_to = $assigned_to");
        }

        let sql = format!("UPDATE $id SET {} RETURN AFTER", assignments.join(", "));
        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("id", record))
            .bind(("now", now_millis));
        if let Some(s) = status {
            query = query.bind(("status", s));
        }
        if let Some(a) = assigned_to {
            query = query.bind(("assigned_to", a.to_string()));
        }

        let mut result = query.await?;
        let updated: Vec<Contact> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Contact {id} not found")))
    }

    /// Log a staff reply and move the contact to `responded`
    pub async fn append_response(
        &self,
        id: &str,
        response: ContactResponse,
        now_millis: i64,
    ) -> RepoResult<Contact> {
        let record = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET responses += $response, status = 'responded', \
                 updated_at = $now RETURN AFTER",
            )
            .bind(("id", record))
            .bind(("response", response))
            .bind(("now", now_millis))
            .await?;
        let updated: Vec<Contact> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Contact {id} not found")))
    }

    /// Contacts still waiting for a first touch
    pub async fn count_new(&self) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("SELECT count() AS count FROM contact WHERE status = 'new' GROUP ALL")
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }
}
