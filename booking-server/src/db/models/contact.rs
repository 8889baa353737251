//! Contact Model
//!
//! 联系表单提交记录。与预约无硬关联，员工在后台跟进。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// Follow-up status of a contact submission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Read,
    Responded,
    Converted,
    Closed,
}

impl ContactStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ContactStatus::New),
            "read" => Some(ContactStatus::Read),
            "responded" => Some(ContactStatus::Responded),
            "converted" => Some(ContactStatus::Converted),
            "closed" => Some(ContactStatus::Closed),
            _ => None,
        }
    }
}

/// Where the inquiry came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    #[default]
    Website,
    Phone,
    Email,
    Referral,
    Other,
}

/// Staff reply logged against a contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub message: String,
    pub responded_by: Option<String>,
    pub responded_at: i64,
}

/// Contact form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Service the customer asked about
    pub service: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub source: ContactSource,
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub responses: Vec<ContactResponse>,
    pub created_at: i64,
    pub updated_at: i64,
}
