//! Request payloads
//!
//! Deserialization targets for the public API. Field-level constraints are
//! declared with `validator`; cross-field rules (guest XOR customer, slot
//! availability) live in the booking service.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-based, default: 1)
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page (default: 20, max: 100)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl PaginationQuery {
    /// Offset for database queries
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * self.limit()
    }

    /// Limit clamped to max 100
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, 100)
    }
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// POST /api/bookings - 创建预约
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// Catalog service id (e.g. "windshield", "repair")
    pub service_id: String,
    /// Appointment day, YYYY-MM-DD
    pub appointment_date: String,
    /// Slot key, HH:MM (must match a generated slot for that day)
    pub time_slot: String,
    pub vehicle: VehicleInput,
    #[serde(default)]
    pub is_mobile_service: bool,
    #[serde(default)]
    pub location: Option<LocationInput>,
    /// Free-text customer note
    #[serde(default)]
    pub notes: Option<String>,

    // Guest contact snapshot. Either all four of these or `customer` must be
    // present.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,

    /// Opaque reference to an externally-authenticated customer identity
    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub use_insurance: bool,
    #[serde(default)]
    pub insurance_info: Option<InsuranceInput>,
}

/// Vehicle details captured at booking time
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VehicleInput {
    #[validate(length(min = 1, max = 100))]
    pub make: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Service location details for mobile jobs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationInput {
    #[serde(default)]
    pub address: Option<AddressInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Street address
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AddressInput {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Insurance claim details
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InsuranceInput {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub claim_number: Option<String>,
}

/// POST /api/bookings/{id}/cancel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// GET /api/bookings/lookup
#[derive(Debug, Clone, Deserialize)]
pub struct BookingLookupQuery {
    pub booking_number: String,
    pub email: String,
}

/// POST /api/calendar/block - 封锁时段
#[derive(Debug, Clone, Deserialize)]
pub struct BlockSlotRequest {
    /// Day to block, YYYY-MM-DD
    pub date: String,
    /// Slot key; ignored when `is_all_day` is set
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
}

/// GET /api/calendar/overview
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// GET /api/calendar/check
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSlotQuery {
    pub date: String,
    pub time_slot: String,
}

/// GET /api/admin/bookings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminBookingsQuery {
    /// Status filter; "all" or absent means no filter
    #[serde(default)]
    pub status: Option<String>,
    /// Day filter, YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// PATCH /api/admin/bookings/{id}/status
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// PATCH /api/admin/bookings/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingAdminUpdate {
    #[serde(default)]
    pub status: Option<String>,
    /// Internal staff note
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_technician: Option<String>,
}

/// POST /api/contact - 联系表单
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 30))]
    pub phone: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// PATCH /api/contact/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

/// POST /api/contact/{id}/respond
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRespondRequest {
    pub message: String,
    #[serde(default)]
    pub responded_by: Option<String>,
}

/// POST /api/payments/create-order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub booking_number: Option<String>,
}

/// POST /api/payments/capture-order
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureOrderRequest {
    pub order_id: String,
    pub booking_number: String,
}
