//! 定时清扫
//!
//! 三个与请求路径共享存储、互不串行的周期任务：
//!
//! | 任务 | 周期 | 动作 |
//! |------|------|------|
//! | reminder_sweep | 每日 | 明日 pending/confirmed 预约发提醒并记审计 |
//! | no_show_sweep | 每小时 | 过点 2 小时仍 confirmed 的预约转 no-show |
//! | stale_pending_sweep | 每日 | 创建超 24h 仍未支付的 pending 批量取消 |

use chrono::Duration;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;

use super::{BookingService, STALE_PENDING_REASON};
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::models::{
    BookingStatus, CancelActor, Cancellation, ReminderChannel, ReminderEntry,
};
use crate::scheduling::Clock;
use crate::utils::AppResult;
use crate::utils::time::date_to_string;

const REMINDER_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(24 * 60 * 60);
const NO_SHOW_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60 * 60);
const STALE_PENDING_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(24 * 60 * 60);

/// Grace period after the slot time before a confirmed booking is a no-show
const NO_SHOW_GRACE_HOURS: i64 = 2;

/// Unpaid pending bookings older than this get auto-cancelled
const STALE_PENDING_HOURS: i64 = 24;

/// Housekeeping over the booking ledger
#[derive(Clone)]
pub struct HousekeepingWorker {
    service: BookingService,
}

impl HousekeepingWorker {
    pub fn new(service: BookingService) -> Self {
        Self { service }
    }

    /// Register all three sweeps. First run happens one full interval after
    /// startup so a restart does not immediately re-fire the daily jobs.
    pub fn spawn_all(self, tasks: &mut BackgroundTasks) {
        self.clone()
            .spawn_loop(tasks, "reminder_sweep", REMINDER_SWEEP_INTERVAL, |w| {
                Box::pin(async move {
                    w.run_reminder_sweep().await.map(|n| n as u64)
                })
            });
        self.clone()
            .spawn_loop(tasks, "no_show_sweep", NO_SHOW_SWEEP_INTERVAL, |w| {
                Box::pin(async move { w.run_no_show_sweep().await.map(|n| n as u64) })
            });
        self.spawn_loop(
            tasks,
            "stale_pending_sweep",
            STALE_PENDING_SWEEP_INTERVAL,
            |w| Box::pin(async move { w.run_stale_pending_sweep().await }),
        );
    }

    fn spawn_loop<F>(
        self,
        tasks: &mut BackgroundTasks,
        name: &'static str,
        period: StdDuration,
        run: F,
    ) where
        F: Fn(
                HousekeepingWorker,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<u64>> + Send>,
            > + Send
            + 'static,
    {
        let token: CancellationToken = tasks.shutdown_token();
        tasks.spawn(name, TaskKind::Periodic, async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        match run(self.clone()).await {
                            Ok(0) => {}
                            Ok(n) => tracing::info!(task = %name, affected = n, "Sweep completed"),
                            Err(e) => tracing::error!(task = %name, error = %e, "Sweep failed"),
                        }
                    }
                }
            }
        });
    }

    /// 提醒清扫：给明日的 pending/confirmed 预约发邮件+短信提醒
    ///
    /// 每个尝试过的渠道各记一条 `reminders` 审计项；渠道之间互不阻塞。
    pub async fn run_reminder_sweep(&self) -> AppResult<usize> {
        let service = &self.service;
        let tomorrow = date_to_string(service.now_local().date() + Duration::days(1));
        let candidates = service.repo.find_reminder_candidates(&tomorrow).await?;
        let count = candidates.len();

        for booking in candidates {
            let Some(id) = booking.id.as_ref().map(|r| r.to_string()) else {
                continue;
            };
            let now_millis = service.clock.now_millis();

            if let Some(email) = booking.contact_email().map(str::to_owned) {
                let entry = ReminderEntry {
                    channel: ReminderChannel::Email,
                    sent_at: now_millis,
                    scheduled_for: booking.appointment.date.clone(),
                };
                if let Err(e) = service.repo.append_reminder(&id, entry).await {
                    tracing::warn!(booking = %booking.booking_number, error = %e,
                        "Failed to record email reminder");
                }
                service.notifier.reminder_email(&booking, &email);
            }

            if let Some(phone) = booking.contact_phone().map(str::to_owned) {
                let entry = ReminderEntry {
                    channel: ReminderChannel::Sms,
                    sent_at: now_millis,
                    scheduled_for: booking.appointment.date.clone(),
                };
                if let Err(e) = service.repo.append_reminder(&id, entry).await {
                    tracing::warn!(booking = %booking.booking_number, error = %e,
                        "Failed to record SMS reminder");
                }
                service.notifier.reminder_sms(&booking, &phone);
            }
        }

        Ok(count)
    }

    /// no-show 清扫：时段过点 2 小时仍 confirmed 的预约转终态
    ///
    /// 只动 confirmed；pending 过点由过期清扫按创建时间处理。
    pub async fn run_no_show_sweep(&self) -> AppResult<usize> {
        let service = &self.service;
        let now = service.now_local();
        let cutoff = now - Duration::hours(NO_SHOW_GRACE_HOURS);
        let today = date_to_string(now.date());

        let candidates = service.repo.find_no_show_candidates(&today).await?;
        let mut marked = 0;

        for booking in candidates {
            let past_grace = booking
                .appointment_datetime()
                .is_some_and(|slot| slot < cutoff);
            if !past_grace {
                continue;
            }
            let Some(id) = booking.id.as_ref().map(|r| r.to_string()) else {
                continue;
            };
            match service
                .repo
                .set_status(&id, BookingStatus::NoShow, service.clock.now_millis())
                .await
            {
                Ok(_) => {
                    marked += 1;
                    tracing::info!(booking = %booking.booking_number, "Marked as no-show");
                }
                Err(e) => {
                    tracing::warn!(booking = %booking.booking_number, error = %e,
                        "Failed to mark no-show");
                }
            }
        }

        Ok(marked)
    }

    /// 过期 pending 清扫：批量取消，不触发逐单通知
    pub async fn run_stale_pending_sweep(&self) -> AppResult<u64> {
        let service = &self.service;
        let now_millis = service.clock.now_millis();
        let cutoff = now_millis - STALE_PENDING_HOURS * 60 * 60 * 1000;

        let cancelled = service
            .repo
            .cancel_stale_pending(
                cutoff,
                Cancellation {
                    cancelled_at: now_millis,
                    reason: STALE_PENDING_REASON.to_string(),
                    cancelled_by: CancelActor::System,
                    refund_issued: None,
                },
                now_millis,
            )
            .await?;

        Ok(cancelled)
    }
}
