//! SMS Webhook API 模块
//!
//! 入站短信传输端点。无论内部发生什么，对传输层始终回应一个
//! 合法的空 XML 应答。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/sms/webhook", post(handler::webhook))
}
