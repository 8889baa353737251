//! Email Provider Client
//!
//! HTTP 邮件服务客户端 (JSON API)。凭证缺失时降级为日志输出。
//! 模板为简化的交易型 HTML。

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use crate::core::config::{BusinessInfo, EmailProviderConfig};
use crate::db::models::{Booking, Contact};

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    config: EmailProviderConfig,
    business: BusinessInfo,
}

#[derive(Serialize)]
struct OutboundEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl EmailClient {
    pub fn new(config: EmailProviderConfig, business: BusinessInfo) -> Self {
        if config.api_url.is_none() || config.api_key.is_none() {
            tracing::info!("Email provider not configured; emails will be logged only");
        }
        Self {
            http: reqwest::Client::new(),
            config,
            business,
        }
    }

    /// The shop's own address (sender, also admin notification target)
    pub fn inbox_address(&self) -> &str {
        &self.config.from_address
    }

    /// Send one email. Degrades to a log line when unconfigured.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let (Some(api_url), Some(api_key)) =
            (self.config.api_url.as_deref(), self.config.api_key.as_deref())
        else {
            tracing::info!(to = %to, subject = %subject, "[Email disabled] would send");
            return Ok(());
        };

        let response = self
            .http
            .post(api_url)
            .bearer_auth(api_key)
            .json(&OutboundEmail {
                from: &self.config.from_address,
                to,
                subject,
                html,
            })
            .send()
            .await
            .context("Email provider request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Email provider rejected message ({status}): {detail}"));
        }

        tracing::debug!(to = %to, "Email sent");
        Ok(())
    }

    // ── Templates ───────────────────────────────────────────────────────

    fn date_line(booking: &Booking) -> String {
        booking
            .appointment_day_start()
            .map(|d| d.format("%A, %B %-d, %Y").to_string())
            .unwrap_or_else(|| booking.appointment.date.clone())
    }

    fn layout(&self, heading: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333; line-height: 1.6;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: #1e40af; color: white; padding: 24px; text-align: center;">
      <h1 style="margin: 0;">{heading}</h1>
      <p style="margin: 4px 0 0;">{business}</p>
    </div>
    <div style="background: #f9fafb; padding: 24px;">{body}</div>
    <div style="text-align: center; padding: 16px; color: #6b7280; font-size: 13px;">
      {business} &middot; {phone}
    </div>
  </div>
</body>
</html>"#,
            heading = heading,
            business = self.business.name,
            body = body,
            phone = self.business.phone,
        )
    }

    fn booking_details(booking: &Booking) -> String {
        format!(
            "<p><strong>Reference:</strong> {}</p>\
             <p><strong>Service:</strong> {}</p>\
             <p><strong>Date:</strong> {}</p>\
             <p><strong>Time:</strong> {}</p>\
             <p><strong>Vehicle:</strong> {} {} {}</p>",
            booking.booking_number,
            booking.service.name,
            Self::date_line(booking),
            booking.appointment.time_slot,
            booking.vehicle.year,
            booking.vehicle.make,
            booking.vehicle.model,
        )
    }

    pub fn booking_confirmation(&self, booking: &Booking) -> (String, String) {
        let subject = format!(
            "Booking Confirmed - {} ({})",
            self.business.name, booking.booking_number
        );
        let html = self.layout("Booking Confirmed", &Self::booking_details(booking));
        (subject, html)
    }

    pub fn appointment_reminder(&self, booking: &Booking) -> (String, String) {
        let subject = format!("Appointment Reminder - {}", self.business.name);
        let body = format!(
            "<p>Your appointment is <strong>tomorrow</strong>.</p>{}",
            Self::booking_details(booking)
        );
        let html = self.layout("Appointment Reminder", &body);
        (subject, html)
    }

    pub fn booking_cancellation(&self, booking: &Booking) -> (String, String) {
        let subject = format!("Booking Cancelled - {}", self.business.name);
        let body = format!(
            "<p>Your appointment has been cancelled.</p>{}<p>To rebook, visit our \
             website or call {}.</p>",
            Self::booking_details(booking),
            self.business.phone,
        );
        let html = self.layout("Booking Cancelled", &body);
        (subject, html)
    }

    pub fn contact_notification(&self, contact: &Contact) -> (String, String) {
        let subject = format!("New contact form submission from {}", contact.name);
        let body = format!(
            "<p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Phone:</strong> {}</p>\
             <p><strong>Service:</strong> {}</p>\
             <p><strong>Message:</strong> {}</p>",
            contact.name,
            contact.email,
            contact.phone,
            contact.service.as_deref().unwrap_or("Not specified"),
            contact.message.as_deref().unwrap_or("None"),
        );
        let html = self.layout("New Contact Form", &body);
        (subject, html)
    }
}
