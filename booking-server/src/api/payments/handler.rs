//! Payments API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::request::{CaptureOrderRequest, CreateOrderRequest};
use shared::response::{CreateOrderResponse, PaymentStatusResponse};

use crate::core::ServerState;
use crate::db::models::{Booking, BookingStatus, Payment, PaymentStatus};
use crate::utils::{AppError, AppResult};

/// GET /api/payments/config - 前端所需的网关公开配置
#[derive(Serialize)]
pub struct PaymentConfigResponse {
    pub paypal_client_id: String,
    pub mode: String,
}

pub async fn config(State(state): State<ServerState>) -> Json<PaymentConfigResponse> {
    Json(PaymentConfigResponse {
        paypal_client_id: state.payments.client_id().to_string(),
        mode: state.payments.mode().to_string(),
    })
}

/// POST /api/payments/create-order - 为预约创建支付订单
pub async fn create_order(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<CreateOrderResponse>> {
    let booking = match (&payload.booking_id, &payload.booking_number) {
        (Some(id), _) => state.bookings.find(id).await?,
        (None, Some(number)) => state.bookings.find_by_number(number).await?,
        (None, None) => {
            return Err(AppError::validation("Booking id or booking number required"));
        }
    };

    if booking.payment.status == PaymentStatus::Paid {
        return Err(AppError::business_rule("Booking already paid"));
    }

    let frontend = &state.config.frontend_url;
    let order = state
        .payments
        .create_order(
            booking.payment.total_amount,
            &booking.booking_number,
            &format!("{} - {}", booking.service.name, booking.booking_number),
            &format!(
                "{frontend}/finance/success?booking={}",
                booking.booking_number
            ),
            &format!("{frontend}/finance/cancel"),
        )
        .await
        .map_err(|e| {
            tracing::error!(booking = %booking.booking_number, error = %e,
                "Payment order creation failed");
            AppError::internal("Failed to create payment")
        })?;

    state
        .bookings
        .record_order_created(&booking, &order.order_id)
        .await?;

    Ok(Json(CreateOrderResponse {
        order_id: order.order_id,
        approval_url: order.approval_url,
    }))
}

/// 捕获成功后的响应
#[derive(Serialize)]
pub struct CaptureResponse {
    pub success: bool,
    pub message: String,
    pub booking_number: String,
    pub status: BookingStatus,
    pub payment: Payment,
}

/// POST /api/payments/capture-order - 捕获已批准的订单
///
/// 捕获成功：payment → paid，预约 → confirmed，交易记录补全。
pub async fn capture_order(
    State(state): State<ServerState>,
    Json(payload): Json<CaptureOrderRequest>,
) -> AppResult<Json<CaptureResponse>> {
    let booking = state.bookings.find_by_number(&payload.booking_number).await?;

    let capture = state
        .payments
        .capture_order(&payload.order_id)
        .await
        .map_err(|e| {
            tracing::error!(booking = %booking.booking_number, error = %e,
                "Payment capture failed");
            AppError::internal("Failed to capture payment")
        })?;

    if capture.status != "COMPLETED" {
        return Err(AppError::business_rule("Payment not completed"));
    }

    let updated: Booking = state.bookings.apply_capture(&booking, &capture).await?;

    Ok(Json(CaptureResponse {
        success: true,
        message: "Payment successful".to_string(),
        booking_number: updated.booking_number.clone(),
        status: updated.status,
        payment: updated.payment,
    }))
}

/// GET /api/payments/status/{booking_number} - 支付状态查询
pub async fn payment_status(
    State(state): State<ServerState>,
    Path(booking_number): Path<String>,
) -> AppResult<Json<PaymentStatusResponse>> {
    let booking = state.bookings.find_by_number(&booking_number).await?;

    let payment_status = serde_json::to_value(booking.payment.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_else(|| "pending".to_string());

    Ok(Json(PaymentStatusResponse {
        booking_number: booking.booking_number,
        payment_status,
        total_amount: booking.payment.total_amount,
        paid_amount: booking.payment.paid_amount,
    }))
}
