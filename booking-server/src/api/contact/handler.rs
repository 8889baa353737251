//! Contact API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shared::request::{ContactRequest, ContactRespondRequest, ContactUpdate, PaginationQuery};
use shared::response::Paginated;
use validator::Validate;

use crate::core::ServerState;
use crate::db::models::{Contact, ContactResponse, ContactSource, ContactStatus};
use crate::scheduling::Clock;
use crate::utils::{AppError, AppResult};

/// POST /api/contact 响应
#[derive(Serialize)]
pub struct ContactSubmittedResponse {
    pub message: &'static str,
    pub contact_id: String,
}

/// POST /api/contact - 提交联系表单 (公开)
///
/// 入库即成功；给商户的邮件/短信通知和给客户的自动回复都是
/// 尽力而为，不影响本次提交的结果。
pub async fn submit(
    State(state): State<ServerState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<ContactSubmittedResponse>)> {
    payload.validate()?;

    let now_millis = state.clock.now_millis();
    let contact = Contact {
        id: None,
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        phone: payload.phone.trim().to_string(),
        service: payload.service,
        message: payload.message,
        status: ContactStatus::New,
        source: ContactSource::Website,
        assigned_to: None,
        responses: Vec::new(),
        created_at: now_millis,
        updated_at: now_millis,
    };

    let created = state.contacts.create(contact).await.map_err(AppError::from)?;
    state.notifier.contact_submitted(&created);

    let contact_id = created.id.map(|r| r.to_string()).unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        Json(ContactSubmittedResponse {
            message: "Thank you! We will be in touch soon.",
            contact_id,
        }),
    ))
}

/// GET /api/contact 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// GET /api/contact - 联系记录列表 (员工)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ContactListQuery>,
) -> AppResult<Json<Paginated<Contact>>> {
    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(s) => Some(
            ContactStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown status: {s}")))?,
        ),
    };

    let pagination = PaginationQuery {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20),
    };
    let limit = pagination.limit();
    let (contacts, total) = state
        .contacts
        .find_paged(status, limit, pagination.offset())
        .await
        .map_err(AppError::from)?;

    Ok(Json(Paginated::new(contacts, pagination.page, limit, total)))
}

/// PATCH /api/contact/{id} - 更新跟进状态 / 指派 (员工)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ContactUpdate>,
) -> AppResult<Json<Contact>> {
    let status = match payload.status.as_deref() {
        None => None,
        Some(s) => Some(
            ContactStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown status: {s}")))?,
        ),
    };

    let updated = state
        .contacts
        .update(
            &id,
            status,
            payload.assigned_to.as_deref(),
            state.clock.now_millis(),
        )
        .await
        .map_err(AppError::from)?;
    Ok(Json(updated))
}

/// POST /api/contact/{id}/respond - 记录员工回复 (员工)
pub async fn respond(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ContactRespondRequest>,
) -> AppResult<Json<Contact>> {
    if payload.message.trim().is_empty() {
        return Err(AppError::validation("message must not be empty"));
    }

    let updated = state
        .contacts
        .append_response(
            &id,
            ContactResponse {
                message: payload.message,
                responded_by: payload.responded_by,
                responded_at: state.clock.now_millis(),
            },
            state.clock.now_millis(),
        )
        .await
        .map_err(AppError::from)?;
    Ok(Json(updated))
}
