//! Service Catalog Model

use serde::{Deserialize, Serialize};

/// Service definition (服务目录条目)
///
/// Catalog entries are loaded at startup and are read-only at runtime.
/// Bookings copy the fields they need into their own snapshot, so price
/// changes here never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub base_price: f64,
    /// Estimated duration in minutes
    pub estimated_duration: u32,
    pub category: ServiceCategory,
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
}

/// Service category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Replacement,
    Repair,
}
