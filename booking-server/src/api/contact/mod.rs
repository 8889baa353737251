//! Contact API 模块

mod handler;

use axum::{
    Router,
    routing::{patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/contact", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::submit).get(handler::list))
        .route("/{id}", patch(handler::update))
        .route("/{id}/respond", post(handler::respond))
}
