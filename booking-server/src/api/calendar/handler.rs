//! Calendar API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Duration;
use shared::models::DayOverview;
use shared::request::{BlockSlotRequest, CheckSlotQuery, OverviewQuery};
use shared::response::{SlotCheckResponse, SlotsResponse};

use crate::core::ServerState;
use crate::db::models::{BlockReason, BlockedSlot, Booking};
use crate::scheduling::Clock;
use crate::utils::time::{date_to_string, parse_date};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};

/// GET /api/calendar/slots/{date} - 查询某日可用时段
pub async fn available_slots(
    State(state): State<ServerState>,
    Path(date): Path<String>,
) -> AppResult<Json<SlotsResponse>> {
    let slots = state.scheduling.available_slots(&date).await?;
    Ok(Json(SlotsResponse {
        date,
        count: slots.len(),
        slots,
    }))
}

/// GET /api/calendar/overview - 日历概览
///
/// 缺省范围：今天起至预约开放窗口结束。
pub async fn overview(
    State(state): State<ServerState>,
    Query(query): Query<OverviewQuery>,
) -> AppResult<Json<Vec<DayOverview>>> {
    let today = state.scheduling.now_local().date();
    let start = match &query.start {
        Some(s) => date_to_string(parse_date(s)?),
        None => date_to_string(today),
    };
    let end = match &query.end {
        Some(e) => date_to_string(parse_date(e)?),
        None => date_to_string(
            today + Duration::days(state.config.schedule.advance_booking_days as i64),
        ),
    };

    let calendar = state.scheduling.calendar_overview(&start, &end).await?;
    Ok(Json(calendar))
}

/// GET /api/calendar/check - 检查单个时段可用性
pub async fn check_slot(
    State(state): State<ServerState>,
    Query(query): Query<CheckSlotQuery>,
) -> AppResult<Json<SlotCheckResponse>> {
    let available = state
        .scheduling
        .is_slot_available(&query.date, &query.time_slot)
        .await?;
    Ok(Json(SlotCheckResponse {
        date: query.date,
        time_slot: query.time_slot,
        available,
    }))
}

/// GET /api/calendar/bookings/{date} - 某日全部预约 (员工)
pub async fn bookings_for_date(
    State(state): State<ServerState>,
    Path(date): Path<String>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state.scheduling.bookings_for_date(&date).await?;
    Ok(Json(bookings))
}

/// POST /api/calendar/block - 封锁时段或整日 (员工)
pub async fn block_slot(
    State(state): State<ServerState>,
    Json(payload): Json<BlockSlotRequest>,
) -> AppResult<Json<BlockedSlot>> {
    let date = date_to_string(parse_date(&payload.date)?);
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    if !payload.is_all_day && payload.time_slot.is_none() {
        return Err(AppError::validation(
            "Either time_slot or is_all_day is required",
        ));
    }

    let block = BlockedSlot {
        id: None,
        date,
        time_slot: if payload.is_all_day {
            None
        } else {
            payload.time_slot
        },
        reason: payload
            .reason
            .as_deref()
            .map(BlockReason::parse)
            .unwrap_or_default(),
        description: payload.description,
        is_all_day: payload.is_all_day,
        created_by: None,
        created_at: state.clock.now_millis(),
    };

    let created = state
        .blocked_slots
        .create(block)
        .await
        .map_err(AppError::from)?;
    Ok(Json(created))
}

/// DELETE /api/calendar/block/{id} - 解除封锁 (员工)
///
/// 对不存在的 id 同样返回成功，重复解除无害。
pub async fn unblock_slot(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    state
        .blocked_slots
        .delete(&id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(true))
}
