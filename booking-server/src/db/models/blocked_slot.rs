//! Blocked Slot Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Why a slot or day was taken off the calendar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BlockReason {
    Holiday,
    Maintenance,
    StaffUnavailable,
    FullyBooked,
    #[default]
    Other,
}

impl BlockReason {
    pub fn parse(s: &str) -> Self {
        match s {
            "holiday" => BlockReason::Holiday,
            "maintenance" => BlockReason::Maintenance,
            "staff-unavailable" => BlockReason::StaffUnavailable,
            "fully-booked" => BlockReason::FullyBooked,
            _ => BlockReason::Other,
        }
    }
}

/// Staff-managed calendar exclusion (排班封锁)
///
/// `time_slot` is absent for whole-day blocks. Overlapping blocks are
/// permitted; availability only checks presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedSlot {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    /// Calendar day, YYYY-MM-DD
    pub date: String,
    pub time_slot: Option<String>,
    pub reason: BlockReason,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_all_day: bool,
    /// Staff identity reference
    pub created_by: Option<String>,
    pub created_at: i64,
}
