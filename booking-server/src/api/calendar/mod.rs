//! Calendar API 模块
//!
//! 可用时段查询、日历概览、时段封锁管理。

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/calendar", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/slots/{date}", get(handler::available_slots))
        .route("/overview", get(handler::overview))
        .route("/check", get(handler::check_slot))
        // staff surface
        .route("/bookings/{date}", get(handler::bookings_for_date))
        .route("/block", post(handler::block_slot))
        .route("/block/{id}", delete(handler::unblock_slot))
}
