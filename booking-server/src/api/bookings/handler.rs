//! Bookings API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::request::{BookingLookupQuery, CancelBookingRequest, CreateBookingRequest};

use crate::core::ServerState;
use crate::db::models::{
    Appointment, Booking, BookingStatus, CancelActor, Payment, ServiceSnapshot, Vehicle,
};
use crate::utils::{AppError, AppResult};

/// 创建成功后返回给客户端的预约摘要
#[derive(Serialize)]
pub struct BookingSummary {
    pub booking_number: String,
    pub service: ServiceSnapshot,
    pub appointment: Appointment,
    pub vehicle: Vehicle,
    pub payment: Payment,
    pub status: BookingStatus,
}

impl From<Booking> for BookingSummary {
    fn from(b: Booking) -> Self {
        Self {
            booking_number: b.booking_number,
            service: b.service,
            appointment: b.appointment,
            vehicle: b.vehicle,
            payment: b.payment,
            status: b.status,
        }
    }
}

/// POST /api/bookings - 创建预约
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingSummary>)> {
    let booking = state.bookings.create(payload).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /api/bookings/lookup - 按预约号 + 邮箱查询 (访客)
///
/// 邮箱不匹配与记录不存在返回同一种 404，不泄露预约号是否有效。
pub async fn lookup(
    State(state): State<ServerState>,
    Query(query): Query<BookingLookupQuery>,
) -> AppResult<Json<Booking>> {
    let booking = state.bookings.find_by_number(&query.booking_number).await?;

    let matches = booking
        .contact_email()
        .is_some_and(|email| email.eq_ignore_ascii_case(query.email.trim()));
    if !matches {
        return Err(AppError::not_found("Booking not found"));
    }

    Ok(Json(booking))
}

/// GET /api/bookings/{id} - 查询单个预约
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = state.bookings.find(&id).await?;
    Ok(Json(booking))
}

/// POST /api/bookings/{id}/cancel - 客户取消 (24 小时窗口内拒绝)
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state
        .bookings
        .cancel(&id, CancelActor::Customer, payload.reason)
        .await?;
    Ok(Json(booking))
}
