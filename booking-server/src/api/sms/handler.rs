//! SMS Webhook Handler

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::core::ServerState;

/// Inbound message fields as the SMS provider posts them
#[derive(Debug, Deserialize)]
pub struct InboundSms {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

/// Empty acknowledgement body the transport expects
const EMPTY_ACK: &str = "<Response></Response>";

/// POST /api/sms/webhook - 入站短信
///
/// 指令处理的全部内部错误都在台账层吞掉；这里只负责按传输协议
/// 应答。缺字段给 400，其余一律 200 空应答。
pub async fn webhook(
    State(state): State<ServerState>,
    Form(payload): Form<InboundSms>,
) -> impl IntoResponse {
    let (Some(from), Some(body)) = (payload.from, payload.body) else {
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, "text/xml")],
            EMPTY_ACK,
        );
    };

    state.bookings.handle_inbound_sms(&from, &body).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_ACK,
    )
}
