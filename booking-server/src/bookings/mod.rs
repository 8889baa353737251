//! 预约台账 - 生命周期权威记录
//!
//! # 结构
//!
//! - [`BookingService`] - 创建、状态机、取消/退款、支付记账
//! - [`housekeeping`] - 定时清扫 (提醒 / no-show / 过期 pending)
//! - [`sms_commands`] - 入站短信指令协议
//!
//! 预约一经落库即为持久事实：通知与支付单创建都是挂在其后的
//! 尽力而为操作，失败不回滚预约。

pub mod housekeeping;
pub mod sms_commands;

use std::sync::Arc;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use shared::request::{BookingAdminUpdate, CreateBookingRequest};
use uuid::Uuid;
use validator::Validate;

use crate::core::config::ServiceCatalog;
use crate::db::models::{
    Address, Appointment, Booking, BookingStatus, CancelActor, Cancellation, GuestInfo, Insurance,
    Location, LocationType, Notes, Payment, PaymentTransaction, ServiceSnapshot, TransactionType,
    Vehicle,
};
use crate::db::repository::BookingRepository;
use crate::scheduling::{Clock, SchedulingService};
use crate::services::Notifier;
use crate::services::payments::CaptureResult;
use crate::utils::time::{date_to_string, parse_date, to_base36, to_business_local};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};

/// Booking number prefix (brand initials)
const BOOKING_NUMBER_PREFIX: &str = "CVG";

/// Fixed reason written by the stale-pending sweep
pub const STALE_PENDING_REASON: &str = "Auto-cancelled: No payment received within 24 hours";

/// The booking ledger
#[derive(Clone)]
pub struct BookingService {
    repo: BookingRepository,
    scheduling: SchedulingService,
    catalog: ServiceCatalog,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl BookingService {
    pub fn new(
        repo: BookingRepository,
        scheduling: SchedulingService,
        catalog: ServiceCatalog,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
        tz: Tz,
    ) -> Self {
        Self {
            repo,
            scheduling,
            catalog,
            notifier,
            clock,
            tz,
        }
    }

    pub fn repo(&self) -> &BookingRepository {
        &self.repo
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn now_local(&self) -> NaiveDateTime {
        to_business_local(self.clock.now_utc(), self.tz)
    }

    /// 创建预约
    ///
    /// 校验顺序：输入 → 服务目录 → 可用性 → 联系方式。任何拒绝都
    /// 发生在落库之前，不产生半成品状态。可用性复查与落库之间存在
    /// 已接受的竞态窗口，上限由 `max_bookings_per_slot` 约束。
    pub async fn create(&self, req: CreateBookingRequest) -> AppResult<Booking> {
        req.validate()?;
        req.vehicle.validate()?;
        validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN)?;

        let day = parse_date(&req.appointment_date)?;
        let date_key = date_to_string(day);

        let service = self
            .catalog
            .find(&req.service_id)
            .ok_or_else(|| AppError::validation("Invalid service"))?;

        if !self
            .scheduling
            .is_slot_available(&date_key, &req.time_slot)
            .await?
        {
            return Err(AppError::conflict("Time slot not available"));
        }

        let guest_info = match (&req.customer, Self::guest_info_from(&req)) {
            (Some(_), _) => None,
            (None, Some(guest)) => Some(guest),
            (None, None) => {
                return Err(AppError::validation("Contact info required"));
            }
        };

        let now_millis = self.clock.now_millis();
        let booking = Booking {
            id: None,
            booking_number: generate_booking_number(now_millis),
            customer: req.customer.clone(),
            guest_info,
            service: ServiceSnapshot {
                service_id: service.id.clone(),
                name: service.name.clone(),
                price: service.base_price,
                estimated_duration: Some(service.estimated_duration),
            },
            vehicle: Vehicle {
                make: req.vehicle.make.clone(),
                model: req.vehicle.model.clone(),
                year: req.vehicle.year,
                vin: req.vehicle.vin.clone(),
                license_plate: req.vehicle.license_plate.clone(),
                color: req.vehicle.color.clone(),
            },
            appointment: Appointment {
                date: date_key,
                time_slot: req.time_slot.clone(),
                is_mobile_service: req.is_mobile_service,
            },
            location: Location {
                location_type: if req.is_mobile_service {
                    LocationType::CustomerLocation
                } else {
                    LocationType::Shop
                },
                address: req.location.as_ref().and_then(|l| {
                    l.address.as_ref().map(|a| Address {
                        street: a.street.clone(),
                        city: a.city.clone(),
                        state: a.state.clone(),
                        zip_code: a.zip_code.clone(),
                    })
                }),
                notes: req.location.as_ref().and_then(|l| l.notes.clone()),
            },
            status: BookingStatus::Pending,
            payment: Payment::pending(service.base_price),
            insurance: req.use_insurance.then(|| Insurance {
                use_insurance: true,
                company: req.insurance_info.as_ref().and_then(|i| i.company.clone()),
                policy_number: req
                    .insurance_info
                    .as_ref()
                    .and_then(|i| i.policy_number.clone()),
                claim_number: req
                    .insurance_info
                    .as_ref()
                    .and_then(|i| i.claim_number.clone()),
            }),
            notes: Notes {
                customer: req.notes.clone(),
                ..Notes::default()
            },
            assigned_technician: None,
            reminders: Vec::new(),
            cancellation: None,
            created_at: now_millis,
            updated_at: now_millis,
        };

        let booking = self.repo.create(booking).await.map_err(AppError::from)?;

        tracing::info!(booking = %booking.booking_number, "Booking created");
        self.notifier.booking_confirmation(&booking);

        Ok(booking)
    }

    fn guest_info_from(req: &CreateBookingRequest) -> Option<GuestInfo> {
        match (&req.first_name, &req.last_name, &req.email, &req.phone) {
            (Some(first), Some(last), Some(email), Some(phone))
                if !first.trim().is_empty()
                    && !last.trim().is_empty()
                    && !email.trim().is_empty()
                    && !phone.trim().is_empty() =>
            {
                Some(GuestInfo {
                    first_name: first.trim().to_string(),
                    last_name: last.trim().to_string(),
                    email: email.trim().to_string(),
                    phone: phone.trim().to_string(),
                })
            }
            _ => None,
        }
    }

    pub async fn find(&self, id: &str) -> AppResult<Booking> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found("Booking not found"))
    }

    pub async fn find_by_number(&self, booking_number: &str) -> AppResult<Booking> {
        self.repo
            .find_by_number(booking_number)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::not_found("Booking not found"))
    }

    /// 取消预约 (网页/后台路径，强制 24 小时窗口)
    pub async fn cancel(
        &self,
        id: &str,
        actor: CancelActor,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        let booking = self.find(id).await?;

        if !booking.can_cancel(self.now_local()) {
            return Err(AppError::business_rule("Cannot cancel this booking"));
        }

        let cancelled = self
            .cancel_unchecked(&booking, actor, reason.unwrap_or_else(default_cancel_reason))
            .await?;
        self.notifier.booking_cancellation(&cancelled);
        Ok(cancelled)
    }

    /// 写入取消记录，不做资格检查 (短信路径与清扫复用)
    async fn cancel_unchecked(
        &self,
        booking: &Booking,
        actor: CancelActor,
        reason: String,
    ) -> AppResult<Booking> {
        let id = booking
            .id
            .as_ref()
            .map(|r| r.to_string())
            .ok_or_else(|| AppError::internal("Booking record has no id"))?;
        let now_millis = self.clock.now_millis();
        let cancelled = self
            .repo
            .cancel(
                &id,
                Cancellation {
                    cancelled_at: now_millis,
                    reason,
                    cancelled_by: actor,
                    refund_issued: None,
                },
                now_millis,
            )
            .await
            .map_err(AppError::from)?;

        tracing::info!(booking = %cancelled.booking_number, actor = ?actor, "Booking cancelled");
        Ok(cancelled)
    }

    /// 员工更新状态 (状态机校验)
    pub async fn set_status(&self, id: &str, status: &str) -> AppResult<Booking> {
        let target = BookingStatus::parse(status)
            .ok_or_else(|| AppError::validation(format!("Unknown status: {status}")))?;
        let booking = self.find(id).await?;

        if !booking.status.can_transition_to(target) {
            return Err(AppError::business_rule(format!(
                "Cannot move booking from {} to {}",
                booking.status.as_str(),
                target.as_str()
            )));
        }

        let id = booking.id.as_ref().map(|r| r.to_string()).unwrap_or_default();
        self.repo
            .set_status(&id, target, self.clock.now_millis())
            .await
            .map_err(AppError::from)
    }

    /// 后台综合更新：状态 / 内部备注 / 技师指派
    pub async fn update_admin(&self, id: &str, update: BookingAdminUpdate) -> AppResult<Booking> {
        validate_optional_text(&update.notes, "notes", MAX_NOTE_LEN)?;

        let booking = self.find(id).await?;
        let status = match &update.status {
            Some(s) => {
                let target = BookingStatus::parse(s)
                    .ok_or_else(|| AppError::validation(format!("Unknown status: {s}")))?;
                if !booking.status.can_transition_to(target) {
                    return Err(AppError::business_rule(format!(
                        "Cannot move booking from {} to {}",
                        booking.status.as_str(),
                        target.as_str()
                    )));
                }
                Some(target)
            }
            None => None,
        };

        let id = booking.id.as_ref().map(|r| r.to_string()).unwrap_or_default();
        self.repo
            .update_admin(
                &id,
                status,
                update.notes.as_deref(),
                update.assigned_technician.as_deref(),
                self.clock.now_millis(),
            )
            .await
            .map_err(AppError::from)
    }

    // ── Payment bookkeeping ─────────────────────────────────────────────

    /// Log a freshly created provider order against the booking
    pub async fn record_order_created(
        &self,
        booking: &Booking,
        order_id: &str,
    ) -> AppResult<()> {
        let id = booking.id.as_ref().map(|r| r.to_string()).unwrap_or_default();
        let mut transactions = booking.payment.transactions.clone();
        transactions.push(PaymentTransaction {
            transaction_id: None,
            provider_order_id: Some(order_id.to_string()),
            amount: booking.payment.total_amount,
            kind: TransactionType::FullPayment,
            status: "created".to_string(),
            timestamp: self.clock.now_millis(),
        });
        self.repo
            .set_transactions(&id, transactions, self.clock.now_millis())
            .await
            .map_err(AppError::from)
    }

    /// Apply a successful capture: payment → paid, booking → confirmed
    pub async fn apply_capture(
        &self,
        booking: &Booking,
        capture: &CaptureResult,
    ) -> AppResult<Booking> {
        let id = booking.id.as_ref().map(|r| r.to_string()).unwrap_or_default();

        let mut transactions = booking.payment.transactions.clone();
        if let Some(tx) = transactions
            .iter_mut()
            .find(|t| t.provider_order_id.as_deref() == Some(capture.order_id.as_str()))
        {
            tx.transaction_id = capture.transaction_id.clone();
            tx.status = "completed".to_string();
        }

        self.repo
            .record_capture(&id, capture.amount, transactions, self.clock.now_millis())
            .await
            .map_err(AppError::from)
    }
}

fn default_cancel_reason() -> String {
    "Customer requested cancellation".to_string()
}

/// 生成预约号：品牌前缀 + 毫秒时间戳 base36 + 4 位随机后缀，全大写
///
/// 冲突概率视为可忽略；真正的唯一性由存储层唯一索引兜底。
pub fn generate_booking_number(now_millis: i64) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect();
    format!(
        "{}-{}-{}",
        BOOKING_NUMBER_PREFIX,
        to_base36(now_millis.max(0) as u64).to_uppercase(),
        suffix.to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_numbers_are_uppercase_and_distinct() {
        let a = generate_booking_number(1_741_600_000_000);
        let b = generate_booking_number(1_741_600_000_000);

        assert!(a.starts_with("CVG-"));
        assert_eq!(a, a.to_uppercase());
        // identical timestamps still diverge through the random suffix
        assert_ne!(a, b);

        let suffix = a.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
