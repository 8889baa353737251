//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`catalog`] - 服务目录
//! - [`calendar`] - 可用时段、日历概览、封锁管理
//! - [`bookings`] - 预约创建/查询/取消
//! - [`payments`] - 支付网关对接
//! - [`sms`] - 入站短信 webhook
//! - [`contact`] - 联系表单
//! - [`admin`] - 后台统计与预约管理

pub mod admin;
pub mod bookings;
pub mod calendar;
pub mod catalog;
pub mod contact;
pub mod health;
pub mod payments;
pub mod sms;

use axum::Router;

use crate::core::ServerState;

/// Assemble the full API surface
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(catalog::router())
        .merge(calendar::router())
        .merge(bookings::router())
        .merge(payments::router())
        .merge(sms::router())
        .merge(contact::router())
        .merge(admin::router())
}
