//! SMS Provider Client
//!
//! Twilio 风格的短信 API 客户端。凭证缺失时进入降级模式：
//! 消息写入日志而不出站，调用方契约不变。

use anyhow::{Context, Result, anyhow};

use crate::core::config::{BusinessInfo, SmsProviderConfig};
use crate::db::models::{Booking, Contact};
use crate::utils::validation::digits_only;

const SMS_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    config: SmsProviderConfig,
    business: BusinessInfo,
}

impl SmsClient {
    pub fn new(config: SmsProviderConfig, business: BusinessInfo) -> Self {
        if config.account_sid.is_none() || config.auth_token.is_none() {
            tracing::info!("SMS provider not configured; messages will be logged only");
        }
        Self {
            http: reqwest::Client::new(),
            config,
            business,
        }
    }

    fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.config.account_sid.as_deref()?,
            self.config.auth_token.as_deref()?,
            self.config.from_phone.as_deref()?,
        ))
    }

    /// Format a phone number to E.164, assuming US numbers for 10 digits
    pub fn format_phone(phone: &str) -> String {
        let digits = digits_only(phone);
        if digits.len() == 10 {
            format!("+1{digits}")
        } else {
            format!("+{digits}")
        }
    }

    /// Send one SMS. Degrades to a log line when unconfigured.
    pub async fn send(&self, to: &str, body: &str) -> Result<()> {
        let Some((sid, token, from)) = self.credentials() else {
            tracing::info!(to = %to, body = %body, "[SMS disabled] would send");
            return Ok(());
        };

        let to = Self::format_phone(to);
        let url = format!("{SMS_API_BASE}/Accounts/{sid}/Messages.json");

        let response = self
            .http
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&[("To", to.as_str()), ("From", from), ("Body", body)])
            .send()
            .await
            .context("SMS provider request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("SMS provider rejected message ({status}): {detail}"));
        }

        tracing::debug!(to = %to, "SMS sent");
        Ok(())
    }

    /// Staff notification number, if configured
    pub fn staff_phone(&self) -> Option<&str> {
        self.config.notify_phone.as_deref()
    }

    // ── Message templates ───────────────────────────────────────────────

    fn appointment_date_line(booking: &Booking) -> String {
        booking
            .appointment_day_start()
            .map(|d| d.format("%A, %B %-d").to_string())
            .unwrap_or_else(|| booking.appointment.date.clone())
    }

    pub fn booking_confirmation_text(&self, booking: &Booking) -> String {
        format!(
            "{}: Your appointment is booked!\n\n\
             Date: {}\nTime: {}\nService: {}\nRef: {}\n\n\
             Reply:\nY - Confirm appointment\nC - Cancel appointment\n\
             R - Request reschedule\nHELP - Get assistance",
            self.business.name,
            Self::appointment_date_line(booking),
            booking.appointment.time_slot,
            booking.service.name,
            booking.booking_number,
        )
    }

    pub fn appointment_reminder_text(&self, booking: &Booking) -> String {
        format!(
            "{} Reminder: Your appointment is TOMORROW!\n\n\
             Time: {}\nRef: {}\n\n\
             Reply:\nY - Confirm attendance\nC - Cancel appointment\n\
             R - Request reschedule",
            self.business.name,
            booking.appointment.time_slot,
            booking.booking_number,
        )
    }

    pub fn booking_cancellation_text(&self, booking: &Booking) -> String {
        format!(
            "{}: Your appointment has been cancelled.\n\n\
             {} at {}\nRef: {}\n\n\
             To rebook, visit our website or call {}",
            self.business.name,
            Self::appointment_date_line(booking),
            booking.appointment.time_slot,
            booking.booking_number,
            self.business.phone,
        )
    }

    pub fn reschedule_ack_text(&self, booking_number: &str) -> String {
        format!(
            "{}: We received your reschedule request for booking {}.\n\n\
             We'll call you within 1 hour to find a new time.\n\n\
             Or call us now: {}",
            self.business.name, booking_number, self.business.phone,
        )
    }

    pub fn confirmation_ack_text(&self, booking_number: &str) -> String {
        format!(
            "{}: Thanks for confirming!\n\n\
             We'll see you at your appointment.\nRef: {}",
            self.business.name, booking_number,
        )
    }

    pub fn help_text(&self) -> String {
        format!(
            "{} Help:\n\nCall: {}\nWeb: {}\n\n\
             Text Commands:\nY - Confirm appointment\nC - Cancel appointment\n\
             R - Request reschedule\nSTOP - Opt out of texts",
            self.business.name, self.business.phone, self.business.website,
        )
    }

    pub fn unknown_command_text(&self) -> String {
        format!(
            "{}: Sorry, we didn't understand that.\n\n\
             Reply:\nY - Confirm\nC - Cancel\nR - Reschedule\nHELP - Get assistance\n\n\
             Or call {}",
            self.business.name, self.business.phone,
        )
    }

    pub fn no_booking_text(&self) -> String {
        format!(
            "We couldn't find an active booking for your number. \
             Please call us at {}",
            self.business.phone,
        )
    }

    pub fn contact_auto_reply_text(&self) -> String {
        format!(
            "Thanks for contacting {}!\n\n\
             We received your message and will get back to you within 24 hours.\n\n\
             Need immediate help? Call {}",
            self.business.name, self.business.phone,
        )
    }

    pub fn contact_notification_text(&self, contact: &Contact) -> String {
        let preview = contact
            .message
            .as_deref()
            .map(|m| m.chars().take(100).collect::<String>())
            .unwrap_or_else(|| "None".to_string());
        format!(
            "New Contact Form!\n\nName: {}\nPhone: {}\nEmail: {}\nService: {}\n\nMessage: {}",
            contact.name,
            contact.phone,
            contact.email,
            contact.service.as_deref().unwrap_or("Not specified"),
            preview,
        )
    }

    pub fn staff_cancellation_alert_text(&self, booking_number: &str, phone: &str) -> String {
        format!(
            "CANCELLATION\n\nBooking {booking_number} was cancelled via SMS by customer.\n\n\
             Phone: {phone}"
        )
    }

    pub fn staff_reschedule_alert_text(&self, booking_number: &str, phone: &str) -> String {
        format!(
            "RESCHEDULE REQUEST\n\nBooking {booking_number}\nPhone: {phone}\n\n\
             Please call customer to reschedule."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e164_formatting() {
        assert_eq!(SmsClient::format_phone("5551234567"), "+15551234567");
        assert_eq!(SmsClient::format_phone("15551234567"), "+15551234567");
        assert_eq!(SmsClient::format_phone("+1 (555) 123-4567"), "+15551234567");
        assert_eq!(SmsClient::format_phone("442071234567"), "+442071234567");
    }
}
