//! Service Catalog API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::ServiceDefinition;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// GET /api/services - 服务目录
pub async fn list(State(state): State<ServerState>) -> Json<Vec<ServiceDefinition>> {
    Json(state.config.catalog.all().to_vec())
}

/// GET /api/services/{id} - 单个服务
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ServiceDefinition>> {
    let service = state
        .config
        .catalog
        .find(&id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Service {id} not found")))?;
    Ok(Json(service))
}
