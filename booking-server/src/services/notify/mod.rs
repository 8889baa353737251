//! 通知模块 - 尽力而为的出站通知
//!
//! 通知失败绝不影响触发它的主操作：每次发送都作为独立任务提交，
//! 错误在任务内部记录日志后丢弃。
//!
//! # 结构
//!
//! - [`email`] - 邮件服务客户端与模板
//! - [`sms`] - 短信服务客户端与模板
//! - [`Notifier`] - 发送门面 (fire-and-forget)

pub mod email;
pub mod sms;

pub use email::EmailClient;
pub use sms::SmsClient;

use crate::db::models::{Booking, Contact};

/// Notification facade
///
/// Every method returns immediately; the actual provider call runs in a
/// spawned task. Channel failures are independent of each other.
#[derive(Clone)]
pub struct Notifier {
    email: EmailClient,
    sms: SmsClient,
}

impl Notifier {
    pub fn new(email: EmailClient, sms: SmsClient) -> Self {
        Self { email, sms }
    }

    pub fn sms(&self) -> &SmsClient {
        &self.sms
    }

    fn spawn_email(&self, to: String, subject: String, html: String) {
        let email = self.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send(&to, &subject, &html).await {
                tracing::warn!(to = %to, error = %e, "Email notification failed");
            }
        });
    }

    fn spawn_sms(&self, to: String, body: String) {
        let sms = self.sms.clone();
        tokio::spawn(async move {
            if let Err(e) = sms.send(&to, &body).await {
                tracing::warn!(to = %to, error = %e, "SMS notification failed");
            }
        });
    }

    /// Confirmation email + SMS after a booking is created
    pub fn booking_confirmation(&self, booking: &Booking) {
        if let Some(to) = booking.contact_email() {
            let (subject, html) = self.email.booking_confirmation(booking);
            self.spawn_email(to.to_string(), subject, html);
        }
        if let Some(to) = booking.contact_phone() {
            self.spawn_sms(to.to_string(), self.sms.booking_confirmation_text(booking));
        }
    }

    /// Cancellation SMS (and email when reachable)
    pub fn booking_cancellation(&self, booking: &Booking) {
        if let Some(to) = booking.contact_email() {
            let (subject, html) = self.email.booking_cancellation(booking);
            self.spawn_email(to.to_string(), subject, html);
        }
        if let Some(to) = booking.contact_phone() {
            self.spawn_sms(to.to_string(), self.sms.booking_cancellation_text(booking));
        }
    }

    /// Reminder email for tomorrow's appointment
    pub fn reminder_email(&self, booking: &Booking, to: &str) {
        let (subject, html) = self.email.appointment_reminder(booking);
        self.spawn_email(to.to_string(), subject, html);
    }

    /// Reminder SMS for tomorrow's appointment
    pub fn reminder_sms(&self, booking: &Booking, to: &str) {
        self.spawn_sms(to.to_string(), self.sms.appointment_reminder_text(booking));
    }

    /// Plain SMS reply (inbound command acknowledgements)
    pub fn sms_reply(&self, to: &str, body: String) {
        self.spawn_sms(to.to_string(), body);
    }

    /// Alert the staff notification number, when one is configured
    pub fn staff_alert(&self, body: String) {
        if let Some(to) = self.sms.staff_phone() {
            self.spawn_sms(to.to_string(), body);
        }
    }

    /// Contact-form fan-out: business email + SMS, customer auto-reply
    pub fn contact_submitted(&self, contact: &Contact) {
        // the shop inbox doubles as the admin notification target
        let (subject, html) = self.email.contact_notification(contact);
        self.spawn_email(self.email.inbox_address().to_string(), subject, html);

        self.staff_alert(self.sms.contact_notification_text(contact));
        self.spawn_sms(contact.phone.clone(), self.sms.contact_auto_reply_text());
    }
}
