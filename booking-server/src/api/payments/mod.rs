//! Payments API 模块
//!
//! 支付网关对接：创建订单、捕获、状态查询。网关协议对核心不透明。

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/config", get(handler::config))
        .route("/create-order", post(handler::create_order))
        .route("/capture-order", post(handler::capture_order))
        .route("/status/{booking_number}", get(handler::payment_status))
}
