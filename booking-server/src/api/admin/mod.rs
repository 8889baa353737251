//! Admin API 模块
//!
//! 仪表盘统计与预约管理。认证/会话属于外部协作方，这里不挂
//! 鉴权层 (与营销站点的演示后台一致)。

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/stats", get(handler::stats))
        .route("/bookings", get(handler::list_bookings))
        .route("/bookings/{id}/status", patch(handler::update_status))
        .route("/bookings/{id}", patch(handler::update_booking))
}
