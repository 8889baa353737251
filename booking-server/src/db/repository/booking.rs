//! Booking Repository
//!
//! 预约集合的读写。所有变更都是针对单文档的目标字段更新，
//! 除批量清理外不做跨文档操作。

use std::collections::HashMap;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, CountRow, RepoError, RepoResult, SumRow, parse_record_id};
use crate::db::models::{
    Booking, BookingStatus, Cancellation, PaymentTransaction, ReminderEntry,
};
use crate::utils::validation::phone_suffix;

const TABLE: &str = "booking";

/// Statuses that consume slot capacity
const ACTIVE_STATUSES: &str = "['pending', 'confirmed', 'in-progress']";

#[derive(Clone)]
pub struct BookingRepository {
    base: BaseRepository,
}

impl BookingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a new booking
    ///
    /// A `booking_number` collision trips the unique index and surfaces as a
    /// generic database error; retry is the caller's call.
    pub async fn create(&self, booking: Booking) -> RepoResult<Booking> {
        let created: Option<Booking> = self.base.db().create(TABLE).content(booking).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create booking".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Booking>> {
        let record = parse_record_id(TABLE, id)?;
        let booking: Option<Booking> = self.base.db().select(record).await?;
        Ok(booking)
    }

    pub async fn find_by_number(&self, booking_number: &str) -> RepoResult<Option<Booking>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM booking WHERE booking_number = $number LIMIT 1")
            .bind(("number", booking_number.to_uppercase()))
            .await?;
        let bookings: Vec<Booking> = result.take(0)?;
        Ok(bookings.into_iter().next())
    }

    /// Most recent pending/confirmed booking whose contact phone matches the
    /// sender's last-10-digit suffix (tolerates country-code variation).
    pub async fn find_active_by_phone(&self, phone: &str) -> RepoResult<Option<Booking>> {
        let Some(wanted) = phone_suffix(phone) else {
            return Ok(None);
        };

        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM booking \
                 WHERE status IN ['pending', 'confirmed'] AND guest_info != NONE \
                 ORDER BY created_at DESC",
            )
            .await?;
        let bookings: Vec<Booking> = result.take(0)?;

        Ok(bookings.into_iter().find(|b| {
            b.contact_phone()
                .and_then(phone_suffix)
                .is_some_and(|suffix| suffix == wanted)
        }))
    }

    /// Per-slot booking tallies for one day, counting only capacity-consuming
    /// statuses (cancelled/completed/no-show release their slot).
    pub async fn count_active_by_slot(&self, date: &str) -> RepoResult<HashMap<String, u32>> {
        #[derive(serde::Deserialize)]
        struct SlotRow {
            time_slot: String,
        }

        let mut result = self
            .base
            .db()
            .query(format!(
                "SELECT appointment.time_slot AS time_slot FROM booking \
                 WHERE appointment.date = $date AND status IN {ACTIVE_STATUSES}"
            ))
            .bind(("date", date.to_string()))
            .await?;
        let rows: Vec<SlotRow> = result.take(0)?;

        let mut counts = HashMap::new();
        for row in rows {
            *counts.entry(row.time_slot).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// All bookings for a day ordered by slot (staff calendar view)
    pub async fn find_for_date(&self, date: &str) -> RepoResult<Vec<Booking>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM booking WHERE appointment.date = $date \
                 ORDER BY appointment.time_slot",
            )
            .bind(("date", date.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Paged admin listing with optional status / day filters
    pub async fn find_paged(
        &self,
        status: Option<&str>,
        date: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> RepoResult<(Vec<Booking>, u64)> {
        let mut conditions = Vec::new();
        if status.is_some() {
            conditions.push("status = $status");
        }
        if date.is_some() {
            conditions.push("appointment.date = $date");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM booking{where_clause} ORDER BY created_at DESC \
             LIMIT $limit START $offset; \
             SELECT count() AS count FROM booking{where_clause} GROUP ALL;"
        );

        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("limit", limit as i64))
            .bind(("offset", offset as i64));
        if let Some(s) = status {
            query = query.bind(("status", s.to_string()));
        }
        if let Some(d) = date {
            query = query.bind(("date", d.to_string()));
        }

        let mut result = query.await?;
        let bookings: Vec<Booking> = result.take(0)?;
        let counts: Vec<CountRow> = result.take(1)?;
        let total = counts.first().map(|c| c.count).unwrap_or(0);
        Ok((bookings, total))
    }

    /// Set booking status (caller is responsible for state-machine checks)
    pub async fn set_status(
        &self,
        id: &str,
        status: BookingStatus,
        now_millis: i64,
    ) -> RepoResult<Booking> {
        let record = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $id SET status = $status, updated_at = $now RETURN AFTER")
            .bind(("id", record))
            .bind(("status", status.as_str().to_string()))
            .bind(("now", now_millis))
            .await?;
        let updated: Vec<Booking> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Booking {id} not found")))
    }

    /// Admin update: status / internal note / technician assignment
    pub async fn update_admin(
        &self,
        id: &str,
        status: Option<BookingStatus>,
        internal_note: Option<&str>,
        technician: Option<&str>,
        now_millis: i64,
    ) -> RepoResult<Booking> {
        let record = parse_record_id(TABLE, id)?;

        let mut assignments = vec!["updated_at = $now"];
        if status.is_some() {
            assignments.push("status = $status");
        }
        if internal_note.is_some() {
            assignments.push("notes.internal = $note");
        }
        if technician.is_some() {
            assignments.push("assigned_technician = $technician");
        }

        let sql = format!("UPDATE $id SET {} RETURN AFTER", assignments.join(", "));
        let mut query = self
            .base
            .db()
            .query(sql)
            .bind(("id", record))
            .bind(("now", now_millis));
        if let Some(s) = status {
            query = query.bind(("status", s.as_str().to_string()));
        }
        if let Some(n) = internal_note {
            query = query.bind(("note", n.to_string()));
        }
        if let Some(t) = technician {
            query = query.bind(("technician", t.to_string()));
        }

        let mut result = query.await?;
        let updated: Vec<Booking> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Booking {id} not found")))
    }

    /// Cancel a booking, writing the cancellation record in the same update
    pub async fn cancel(
        &self,
        id: &str,
        cancellation: Cancellation,
        now_millis: i64,
    ) -> RepoResult<Booking> {
        let record = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET status = 'cancelled', cancellation = $cancellation, \
                 updated_at = $now RETURN AFTER",
            )
            .bind(("id", record))
            .bind(("cancellation", cancellation))
            .bind(("now", now_millis))
            .await?;
        let updated: Vec<Booking> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Booking {id} not found")))
    }

    /// Flag a reschedule request without changing status
    pub async fn mark_reschedule_requested(&self, id: &str, now_millis: i64) -> RepoResult<()> {
        let record = parse_record_id(TABLE, id)?;
        self.base
            .db()
            .query(
                "UPDATE $id SET notes.reschedule_requested = true, \
                 notes.reschedule_requested_at = $now, updated_at = $now",
            )
            .bind(("id", record))
            .bind(("now", now_millis))
            .await?;
        Ok(())
    }

    /// Append one reminder audit entry
    pub async fn append_reminder(&self, id: &str, entry: ReminderEntry) -> RepoResult<()> {
        let record = parse_record_id(TABLE, id)?;
        let now_millis = entry.sent_at;
        self.base
            .db()
            .query("UPDATE $id SET reminders += $entry, updated_at = $now")
            .bind(("id", record))
            .bind(("entry", entry))
            .bind(("now", now_millis))
            .await?;
        Ok(())
    }

    /// Replace the payment transaction log (after appending a created order)
    pub async fn set_transactions(
        &self,
        id: &str,
        transactions: Vec<PaymentTransaction>,
        now_millis: i64,
    ) -> RepoResult<()> {
        let record = parse_record_id(TABLE, id)?;
        self.base
            .db()
            .query("UPDATE $id SET payment.transactions = $transactions, updated_at = $now")
            .bind(("id", record))
            .bind(("transactions", transactions))
            .bind(("now", now_millis))
            .await?;
        Ok(())
    }

    /// Record a successful payment capture: payment paid, booking confirmed
    pub async fn record_capture(
        &self,
        id: &str,
        paid_amount: f64,
        transactions: Vec<PaymentTransaction>,
        now_millis: i64,
    ) -> RepoResult<Booking> {
        let record = parse_record_id(TABLE, id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $id SET payment.status = 'paid', payment.paid_amount = $amount, \
                 payment.transactions = $transactions, status = 'confirmed', \
                 updated_at = $now RETURN AFTER",
            )
            .bind(("id", record))
            .bind(("amount", paid_amount))
            .bind(("transactions", transactions))
            .bind(("now", now_millis))
            .await?;
        let updated: Vec<Booking> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Booking {id} not found")))
    }

    // ── Housekeeping queries ────────────────────────────────────────────

    /// Pending/confirmed bookings on a given day (reminder sweep)
    pub async fn find_reminder_candidates(&self, date: &str) -> RepoResult<Vec<Booking>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM booking WHERE appointment.date = $date \
                 AND status IN ['pending', 'confirmed']",
            )
            .bind(("date", date.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Confirmed bookings on or before a day (no-show sweep candidates;
    /// the caller applies the slot-time cutoff)
    pub async fn find_no_show_candidates(&self, date: &str) -> RepoResult<Vec<Booking>> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM booking WHERE appointment.date <= $date \
                 AND status = 'confirmed'",
            )
            .bind(("date", date.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Bulk-cancel stale unpaid pending bookings. Returns how many changed.
    pub async fn cancel_stale_pending(
        &self,
        created_before_millis: i64,
        cancellation: Cancellation,
        now_millis: i64,
    ) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE booking SET status = 'cancelled', cancellation = $cancellation, \
                 updated_at = $now \
                 WHERE status = 'pending' AND payment.status = 'pending' \
                 AND created_at < $cutoff RETURN AFTER",
            )
            .bind(("cancellation", cancellation))
            .bind(("now", now_millis))
            .bind(("cutoff", created_before_millis))
            .await?;
        let updated: Vec<Booking> = result.take(0)?;
        Ok(updated.len() as u64)
    }

    // ── Dashboard counters ──────────────────────────────────────────────

    /// Bookings on one day, optionally narrowed to a status
    pub async fn count_on_date(
        &self,
        date: &str,
        status: Option<BookingStatus>,
    ) -> RepoResult<u64> {
        let sql = match status {
            Some(_) => {
                "SELECT count() AS count FROM booking \
                 WHERE appointment.date = $date AND status = $status GROUP ALL"
            }
            None => "SELECT count() AS count FROM booking WHERE appointment.date = $date GROUP ALL",
        };
        let mut query = self.base.db().query(sql).bind(("date", date.to_string()));
        if let Some(s) = status {
            query = query.bind(("status", s.as_str().to_string()));
        }
        let mut result = query.await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }

    /// Bookings with appointment days in [start, end] (inclusive day keys)
    pub async fn count_in_date_range(&self, start: &str, end: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM booking \
                 WHERE appointment.date >= $start AND appointment.date <= $end GROUP ALL",
            )
            .bind(("start", start.to_string()))
            .bind(("end", end.to_string()))
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }

    /// Bookings with appointment days on or after `start` (includes future)
    pub async fn count_from_date(&self, start: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM booking \
                 WHERE appointment.date >= $start GROUP ALL",
            )
            .bind(("start", start.to_string()))
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }

    /// Paid revenue from bookings created since `since_millis`
    pub async fn paid_revenue_since(&self, since_millis: i64) -> RepoResult<f64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT math::sum(payment.paid_amount) AS total FROM booking \
                 WHERE payment.status = 'paid' AND created_at >= $since GROUP ALL",
            )
            .bind(("since", since_millis))
            .await?;
        let sums: Vec<SumRow> = result.take(0)?;
        Ok(sums.first().map(|s| s.total).unwrap_or(0.0))
    }

    /// Bookings whose payment is still pending
    pub async fn count_pending_payments(&self) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM booking \
                 WHERE payment.status = 'pending' GROUP ALL",
            )
            .await?;
        let counts: Vec<CountRow> = result.take(0)?;
        Ok(counts.first().map(|c| c.count).unwrap_or(0))
    }
}
