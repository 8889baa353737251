//! Booking Model
//!
//! 预约聚合：生命周期状态机、支付子状态、取消与退款规则。
//! `service` / `vehicle` / `appointment` / `payment` 均为创建时快照，
//! 目录价格变动不回写历史记录。

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;
use crate::utils::time::{parse_date, parse_slot_time};

// =============================================================================
// Booking (主表)
// =============================================================================

/// Booking lifecycle status
///
/// `Cancelled`, `Completed` and `NoShow` are terminal; nothing leaves them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// Wire form, e.g. "in-progress"
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in-progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "no-show" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// Terminal states cannot be left
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Completed | BookingStatus::NoShow
        )
    }

    /// Position along pending → confirmed → in-progress → completed
    fn forward_rank(&self) -> Option<u8> {
        match self {
            BookingStatus::Pending => Some(0),
            BookingStatus::Confirmed => Some(1),
            BookingStatus::InProgress => Some(2),
            BookingStatus::Completed => Some(3),
            _ => None,
        }
    }

    /// 状态机判定：是否允许 from → to
    ///
    /// 允许沿主链前进 (跳级允许)，pending|confirmed → cancelled，
    /// confirmed → no-show。终态不可离开，状态单调不可回退。
    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        if self.is_terminal() || *self == to {
            return false;
        }
        match to {
            BookingStatus::Cancelled => {
                matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
            }
            BookingStatus::NoShow => matches!(self, BookingStatus::Confirmed),
            _ => match (self.forward_rank(), to.forward_rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

/// Payment sub-state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Pending,
    DepositPaid,
    Paid,
    Refunded,
    Failed,
}

/// Payment method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Paypal,
    Card,
    Cash,
    Insurance,
}

/// Transaction kind in the payment log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Deposit,
    FullPayment,
    Refund,
}

/// Who triggered a cancellation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancelActor {
    Customer,
    Admin,
    System,
}

/// Where the work happens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    #[default]
    Shop,
    CustomerLocation,
}

/// Reminder channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    Email,
    Sms,
}

/// Guest contact snapshot (bookings without an authenticated customer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Denormalized service snapshot taken at booking time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub service_id: String,
    pub name: String,
    pub price: f64,
    pub estimated_duration: Option<u32>,
}

/// Vehicle details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub color: Option<String>,
}

/// Appointment slot reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Calendar day, YYYY-MM-DD
    pub date: String,
    /// Slot key, HH:MM (matches the generator's output for that day)
    pub time_slot: String,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_mobile_service: bool,
}

/// Service location
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Street address
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Payment aggregate with append-oriented transaction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub deposit_amount: f64,
    #[serde(default)]
    pub transactions: Vec<PaymentTransaction>,
}

impl Payment {
    pub fn pending(total_amount: f64) -> Self {
        Self {
            status: PaymentStatus::Pending,
            method: PaymentMethod::Paypal,
            total_amount,
            paid_amount: 0.0,
            deposit_amount: 0.0,
            transactions: Vec::new(),
        }
    }
}

/// One entry in the payment transaction log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// Provider capture/transaction id (set on completion)
    pub transaction_id: Option<String>,
    /// Provider order id (set at creation)
    pub provider_order_id: Option<String>,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: String,
    pub timestamp: i64,
}

/// Insurance claim details
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Insurance {
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub use_insurance: bool,
    pub company: Option<String>,
    pub policy_number: Option<String>,
    pub claim_number: Option<String>,
}

/// Customer / staff notes plus the reschedule-request marker
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Notes {
    pub customer: Option<String>,
    pub internal: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub reschedule_requested: bool,
    pub reschedule_requested_at: Option<i64>,
}

/// Audit entry for a reminder notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEntry {
    #[serde(rename = "type")]
    pub channel: ReminderChannel,
    pub sent_at: i64,
    /// Appointment day the reminder was for
    pub scheduled_for: String,
}

/// Cancellation record, populated once on cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_at: i64,
    pub reason: String,
    pub cancelled_by: CancelActor,
    pub refund_issued: Option<bool>,
}

/// Booking aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    /// Human-shareable identifier, unique and immutable
    pub booking_number: String,
    /// Opaque reference to an externally-authenticated customer identity
    pub customer: Option<String>,
    /// Guest contact snapshot; exactly one of `customer` / `guest_info` is set
    pub guest_info: Option<GuestInfo>,
    pub service: ServiceSnapshot,
    pub vehicle: Vehicle,
    pub appointment: Appointment,
    #[serde(default)]
    pub location: Location,
    pub status: BookingStatus,
    pub payment: Payment,
    pub insurance: Option<Insurance>,
    #[serde(default)]
    pub notes: Notes,
    pub assigned_technician: Option<String>,
    #[serde(default)]
    pub reminders: Vec<ReminderEntry>,
    pub cancellation: Option<Cancellation>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Booking {
    /// 预约日零点 (取消/退款规则的时间基准)
    pub fn appointment_day_start(&self) -> Option<NaiveDateTime> {
        parse_date(&self.appointment.date)
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    }

    /// 预约时刻 (日期 + 时段)
    pub fn appointment_datetime(&self) -> Option<NaiveDateTime> {
        let date = parse_date(&self.appointment.date).ok()?;
        let time = parse_slot_time(&self.appointment.time_slot).ok()?;
        Some(date.and_time(time))
    }

    /// 距预约日零点的小时数，日期损坏时视为 0
    pub fn hours_until_appointment(&self, now_local: NaiveDateTime) -> f64 {
        self.appointment_day_start()
            .map(|start| (start - now_local).num_minutes() as f64 / 60.0)
            .unwrap_or(0.0)
    }

    /// 取消资格：状态 pending|confirmed 且距预约 >= 24 小时
    pub fn can_cancel(&self, now_local: NaiveDateTime) -> bool {
        matches!(
            self.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) && self.hours_until_appointment(now_local) >= 24.0
    }

    /// 退款金额 (建议值，实际退款由支付网关执行)
    ///
    /// >= 48h 全额；[24h, 48h) 半额；< 24h 为零。
    /// 始终基于当前时刻现算，不落库。
    pub fn calculate_refund(&self, now_local: NaiveDateTime) -> f64 {
        let hours = self.hours_until_appointment(now_local);
        if hours >= 48.0 {
            self.payment.paid_amount
        } else if hours >= 24.0 {
            self.payment.paid_amount * 0.5
        } else {
            0.0
        }
    }

    /// Reachable contact email (guest bookings carry it inline)
    pub fn contact_email(&self) -> Option<&str> {
        self.guest_info.as_ref().map(|g| g.email.as_str())
    }

    /// Reachable contact phone
    pub fn contact_phone(&self) -> Option<&str> {
        self.guest_info.as_ref().map(|g| g.phone.as_str())
    }

    /// First name for salutation in notifications
    pub fn contact_first_name(&self) -> Option<&str> {
        self.guest_info.as_ref().map(|g| g.first_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn booking_on(date: &str, slot: &str, status: BookingStatus, paid: f64) -> Booking {
        Booking {
            id: None,
            booking_number: "CVG-TEST-0001".to_string(),
            customer: None,
            guest_info: Some(GuestInfo {
                first_name: "Ana".to_string(),
                last_name: "Reyes".to_string(),
                email: "ana@example.com".to_string(),
                phone: "5551234567".to_string(),
            }),
            service: ServiceSnapshot {
                service_id: "repair".to_string(),
                name: "Auto Glass Repair".to_string(),
                price: 49.99,
                estimated_duration: Some(30),
            },
            vehicle: Vehicle {
                make: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2021,
                vin: None,
                license_plate: None,
                color: None,
            },
            appointment: Appointment {
                date: date.to_string(),
                time_slot: slot.to_string(),
                is_mobile_service: false,
            },
            location: Location::default(),
            status,
            payment: Payment {
                paid_amount: paid,
                ..Payment::pending(100.0)
            },
            insurance: None,
            notes: Notes::default(),
            assigned_technician: None,
            reminders: Vec::new(),
            cancellation: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn refund_tiers_follow_notice_window() {
        let b = booking_on("2025-03-10", "10:00", BookingStatus::Confirmed, 100.0);

        // 72h out: full refund
        assert_eq!(b.calculate_refund(local(2025, 3, 7, 0, 0)), 100.0);
        // 36h out: half refund
        assert_eq!(b.calculate_refund(local(2025, 3, 8, 12, 0)), 50.0);
        // 12h out: nothing
        assert_eq!(b.calculate_refund(local(2025, 3, 9, 12, 0)), 0.0);
    }

    #[test]
    fn cancellation_window_closes_at_24h() {
        let b = booking_on("2025-03-10", "10:00", BookingStatus::Confirmed, 100.0);

        assert!(b.can_cancel(local(2025, 3, 8, 12, 0)));
        assert!(!b.can_cancel(local(2025, 3, 9, 12, 0)));
    }

    #[test]
    fn terminal_statuses_cannot_cancel() {
        for status in [
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
            BookingStatus::InProgress,
        ] {
            let b = booking_on("2025-03-10", "10:00", status, 100.0);
            assert!(!b.can_cancel(local(2025, 3, 1, 0, 0)), "{status:?}");
        }
    }

    #[test]
    fn state_machine_forward_only() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(InProgress.can_transition_to(Completed));

        // no resurrection, no backwards movement
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!NoShow.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(NoShow));
    }

    #[test]
    fn status_wire_forms_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
