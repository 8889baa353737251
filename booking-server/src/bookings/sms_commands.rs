//! 入站短信指令协议
//!
//! 固定指令集，大小写不敏感。指令解析是纯函数；调度在
//! [`BookingService::handle_inbound_sms`]，按发信号码后 10 位匹配
//! 最近的 pending/confirmed 预约。
//!
//! 短信 CANCEL 不走 24 小时资格检查，这是与网页取消路径之间
//! 有意保留的不对称 (见 DESIGN.md)。

use super::BookingService;
use crate::db::models::{BookingStatus, CancelActor};
use crate::scheduling::Clock;

/// Parsed inbound command token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsCommand {
    /// Y / YES / CONFIRM
    Confirm,
    /// C / CANCEL
    Cancel,
    /// R / RESCHEDULE
    Reschedule,
    /// HELP / INFO
    Help,
    /// STOP / UNSUBSCRIBE
    Stop,
    /// Anything else
    Unknown,
}

impl SmsCommand {
    /// Match a raw message body against the fixed token table
    pub fn parse(body: &str) -> Self {
        match body.trim().to_uppercase().as_str() {
            "Y" | "YES" | "CONFIRM" => SmsCommand::Confirm,
            "C" | "CANCEL" => SmsCommand::Cancel,
            "R" | "RESCHEDULE" => SmsCommand::Reschedule,
            "HELP" | "INFO" => SmsCommand::Help,
            "STOP" | "UNSUBSCRIBE" => SmsCommand::Stop,
            _ => SmsCommand::Unknown,
        }
    }

    /// Commands that act on a booking need one resolved first
    fn needs_booking(&self) -> bool {
        matches!(
            self,
            SmsCommand::Confirm | SmsCommand::Cancel | SmsCommand::Reschedule
        )
    }
}

impl BookingService {
    /// 处理一条入站短信
    ///
    /// 永不向传输层返回失败：内部错误在此记录并吞掉，webhook 总能
    /// 回应一个合法的空应答。
    pub async fn handle_inbound_sms(&self, from: &str, body: &str) {
        let command = SmsCommand::parse(body);
        tracing::info!(from = %from, command = ?command, "Inbound SMS");

        if let Err(e) = self.dispatch_sms_command(from, command).await {
            tracing::error!(from = %from, error = %e, "Inbound SMS handling failed");
        }
    }

    async fn dispatch_sms_command(
        &self,
        from: &str,
        command: SmsCommand,
    ) -> Result<(), crate::utils::AppError> {
        let notifier = self.notifier().clone();
        let sms = notifier.sms().clone();

        // Stateless commands reply without a booking lookup
        match command {
            SmsCommand::Help => {
                notifier.sms_reply(from, sms.help_text());
                return Ok(());
            }
            SmsCommand::Stop => {
                // the SMS provider handles opt-out itself; log only
                tracing::info!(from = %from, "SMS opt-out received");
                return Ok(());
            }
            SmsCommand::Unknown => {
                notifier.sms_reply(from, sms.unknown_command_text());
                return Ok(());
            }
            _ => {}
        }

        debug_assert!(command.needs_booking());

        let booking = self.repo().find_active_by_phone(from).await?;
        let Some(booking) = booking else {
            notifier.sms_reply(from, sms.no_booking_text());
            return Ok(());
        };
        let booking_id = booking
            .id
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_default();

        match command {
            SmsCommand::Confirm => {
                if booking.status == BookingStatus::Pending {
                    self.repo()
                        .set_status(&booking_id, BookingStatus::Confirmed, self.now_millis())
                        .await?;
                }
                notifier.sms_reply(from, sms.confirmation_ack_text(&booking.booking_number));
                tracing::info!(booking = %booking.booking_number, "Confirmed via SMS");
            }
            SmsCommand::Cancel => {
                // deliberately skips the 24-hour window the web path enforces
                let cancelled = self
                    .cancel_unchecked(&booking, CancelActor::Customer, "Cancelled via SMS".to_string())
                    .await?;
                notifier.sms_reply(from, sms.booking_cancellation_text(&cancelled));
                notifier.staff_alert(
                    sms.staff_cancellation_alert_text(&cancelled.booking_number, from),
                );
                tracing::info!(booking = %cancelled.booking_number, "Cancelled via SMS");
            }
            SmsCommand::Reschedule => {
                self.repo()
                    .mark_reschedule_requested(&booking_id, self.now_millis())
                    .await?;
                notifier.sms_reply(from, sms.reschedule_ack_text(&booking.booking_number));
                notifier
                    .staff_alert(sms.staff_reschedule_alert_text(&booking.booking_number, from));
                tracing::info!(booking = %booking.booking_number, "Reschedule requested via SMS");
            }
            _ => unreachable!("stateless commands handled above"),
        }

        Ok(())
    }

    fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_table_matches_case_insensitively() {
        for body in ["Y", "y", "YES", "yes", " confirm "] {
            assert_eq!(SmsCommand::parse(body), SmsCommand::Confirm, "{body:?}");
        }
        for body in ["C", "c", "CANCEL", "cancel"] {
            assert_eq!(SmsCommand::parse(body), SmsCommand::Cancel, "{body:?}");
        }
        for body in ["R", "reschedule"] {
            assert_eq!(SmsCommand::parse(body), SmsCommand::Reschedule, "{body:?}");
        }
        for body in ["HELP", "info"] {
            assert_eq!(SmsCommand::parse(body), SmsCommand::Help, "{body:?}");
        }
        for body in ["STOP", "unsubscribe"] {
            assert_eq!(SmsCommand::parse(body), SmsCommand::Stop, "{body:?}");
        }
        for body in ["maybe", "", "YEP", "cancel please"] {
            assert_eq!(SmsCommand::parse(body), SmsCommand::Unknown, "{body:?}");
        }
    }
}
