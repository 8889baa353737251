//! Admin API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Datelike, Duration, NaiveTime};
use shared::request::{AdminBookingsQuery, BookingAdminUpdate, StatusUpdateRequest};
use shared::response::{DashboardStats, Paginated};

use crate::core::ServerState;
use crate::db::models::{Booking, BookingStatus};
use crate::utils::time::{date_to_string, local_to_millis, parse_date};
use crate::utils::{AppError, AppResult};

/// GET /api/admin/stats - 仪表盘统计
pub async fn stats(State(state): State<ServerState>) -> AppResult<Json<DashboardStats>> {
    let now = state.scheduling.now_local();
    let today = now.date();
    let today_key = date_to_string(today);

    // week starts on Sunday
    let week_start =
        date_to_string(today - Duration::days(today.weekday().num_days_from_sunday() as i64));

    let month_start = today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN);
    let month_start_millis = local_to_millis(month_start, state.config.business_timezone);

    let repo = state.bookings.repo();
    let today_bookings = repo.count_on_date(&today_key, None).await?;
    let week_bookings = repo.count_from_date(&week_start).await?;
    let month_revenue = repo.paid_revenue_since(month_start_millis).await?;
    let confirmed_today = repo
        .count_on_date(&today_key, Some(BookingStatus::Confirmed))
        .await?;
    let pending_payments = repo.count_pending_payments().await?;
    let pending_contacts = state.contacts.count_new().await?;

    Ok(Json(DashboardStats {
        today_bookings,
        week_bookings,
        month_revenue,
        pending_contacts,
        confirmed_today,
        pending_payments,
    }))
}

/// GET /api/admin/bookings - 预约列表 (状态/日期过滤 + 分页)
pub async fn list_bookings(
    State(state): State<ServerState>,
    Query(query): Query<AdminBookingsQuery>,
) -> AppResult<Json<Paginated<Booking>>> {
    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(s) => {
            // reject unknown filters instead of silently returning everything
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown status: {s}")))?;
            Some(s.to_string())
        }
    };

    let date = match query.date.as_deref() {
        Some(d) => Some(date_to_string(parse_date(d)?)),
        None => None,
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let (bookings, total) = state
        .bookings
        .repo()
        .find_paged(status.as_deref(), date.as_deref(), limit, offset)
        .await?;

    Ok(Json(Paginated::new(bookings, page, limit, total)))
}

/// PATCH /api/admin/bookings/{id}/status - 更新预约状态 (状态机校验)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state.bookings.set_status(&id, &payload.status).await?;
    Ok(Json(booking))
}

/// PATCH /api/admin/bookings/{id} - 综合更新 (状态/备注/技师)
pub async fn update_booking(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BookingAdminUpdate>,
) -> AppResult<Json<Booking>> {
    let booking = state.bookings.update_admin(&id, payload).await?;
    Ok(Json(booking))
}
