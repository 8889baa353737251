//! API Response types
//!
//! 分页与通用响应结构。错误响应结构见服务端 `utils::error`。

use serde::{Deserialize, Serialize};

/// Paginated list response
///
/// ```json
/// {
///   "items": [ ... ],
///   "pagination": { "page": 1, "limit": 20, "total": 57, "pages": 3 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Pagination envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        let limit_nz = limit.max(1) as u64;
        Self {
            items,
            pagination: Pagination {
                page,
                limit,
                total,
                pages: total.div_ceil(limit_nz),
            },
        }
    }
}

/// GET /api/calendar/slots/{date} response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<crate::models::TimeSlot>,
    pub count: usize,
}

/// GET /api/calendar/check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCheckResponse {
    pub date: String,
    pub time_slot: String,
    pub available: bool,
}

/// Admin dashboard statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_bookings: u64,
    pub week_bookings: u64,
    pub month_revenue: f64,
    pub pending_contacts: u64,
    pub confirmed_today: u64,
    pub pending_payments: u64,
}

/// POST /api/payments/create-order response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
}

/// GET /api/payments/status/{booking_number} response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub booking_number: String,
    pub payment_status: String,
    pub total_amount: f64,
    pub paid_amount: f64,
}
