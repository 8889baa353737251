//! End-to-end booking flow against a temp RocksDB store.
//! Run: cargo test -p booking-server --test booking_flow

use std::sync::{Arc, Mutex};

use booking_server::core::{Config, ServerState};
use booking_server::db::DbService;
use booking_server::db::models::{BlockedSlot, BookingStatus, CancelActor};
use booking_server::bookings::housekeeping::HousekeepingWorker;
use booking_server::scheduling::Clock;
use booking_server::utils::AppError;
use chrono::{DateTime, TimeZone, Utc};
use shared::request::{CreateBookingRequest, VehicleInput};
use tempfile::TempDir;

/// Pinned, settable time source
#[derive(Clone)]
struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Self {
        Self(Arc::new(Mutex::new(
            Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap(),
        )))
    }

    fn set(&self, y: i32, mo: u32, d: u32, h: u32, mi: u32) {
        *self.0.lock().unwrap() = Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap();
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Fresh state over a throwaway store. Business timezone is pinned to UTC so
/// the manual clock reads as local time directly.
async fn test_state(clock: &ManualClock, max_per_slot: u32) -> (ServerState, TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let db_service = DbService::new(&tmp.path().join("db")).await.unwrap();

    let mut config = Config::from_env();
    config.business_timezone = chrono_tz::UTC;
    config.schedule.max_bookings_per_slot = max_per_slot;

    let state = ServerState::with_db(config, db_service.db, Arc::new(clock.clone()));
    (state, tmp)
}

fn booking_request(date: &str, slot: &str, phone: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        service_id: "repair".to_string(),
        appointment_date: date.to_string(),
        time_slot: slot.to_string(),
        vehicle: VehicleInput {
            make: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2021,
            vin: None,
            license_plate: None,
            color: None,
        },
        is_mobile_service: false,
        location: None,
        notes: None,
        first_name: Some("Ana".to_string()),
        last_name: Some("Reyes".to_string()),
        email: Some("ana@example.com".to_string()),
        phone: Some(phone.to_string()),
        customer: None,
        use_insurance: false,
        insurance_info: None,
    }
}

#[tokio::test]
async fn booking_consumes_slot_end_to_end() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 1).await;

    // 2025-03-10 is a Monday; the morning slot is offered
    let slots = state.scheduling.available_slots("2025-03-10").await.unwrap();
    assert!(!slots.is_empty());
    let nine = slots.iter().find(|s| s.time == "09:00").unwrap();
    assert_eq!(nine.display, "9:00 AM");

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "09:00", "5551234567"))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.service.price, 49.99);
    assert_eq!(booking.payment.total_amount, 49.99);
    assert!(!booking.booking_number.is_empty());
    assert_eq!(booking.booking_number, booking.booking_number.to_uppercase());
    assert!(booking.booking_number.contains('-'));

    // capacity 1: the slot is gone from the next availability read
    let slots = state.scheduling.available_slots("2025-03-10").await.unwrap();
    assert!(!slots.iter().any(|s| s.time == "09:00"));

    // a second booking for the same slot is a conflict, not a validation error
    let err = state
        .bookings
        .create(booking_request("2025-03-10", "09:00", "5559990000"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn unknown_service_and_missing_contact_are_validation_errors() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let mut req = booking_request("2025-03-10", "09:00", "5551234567");
    req.service_id = "detailing".to_string();
    let err = state.bookings.create(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");

    let mut req = booking_request("2025-03-10", "09:00", "5551234567");
    req.first_name = None;
    req.customer = None;
    let err = state.bookings.create(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn cancellation_frees_capacity() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let first = state
        .bookings
        .create(booking_request("2025-03-10", "10:00", "5551110001"))
        .await
        .unwrap();
    state
        .bookings
        .create(booking_request("2025-03-10", "10:00", "5551110002"))
        .await
        .unwrap();

    // two active bookings exhaust the slot at capacity 2
    assert!(
        !state
            .scheduling
            .is_slot_available("2025-03-10", "10:00")
            .await
            .unwrap()
    );

    // cancelling one brings it back
    let id = first.id.as_ref().unwrap().to_string();
    let cancelled = state
        .bookings
        .cancel(&id, CancelActor::Customer, None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation.as_ref().unwrap().cancelled_by,
        CancelActor::Customer
    );

    assert!(
        state
            .scheduling
            .is_slot_available("2025-03-10", "10:00")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn cancellation_rejected_inside_24_hours() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "10:00", "5551234567"))
        .await
        .unwrap();

    // 12 hours before the appointment day starts
    clock.set(2025, 3, 9, 12, 0);

    let id = booking.id.as_ref().unwrap().to_string();
    let err = state
        .bookings
        .cancel(&id, CancelActor::Customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)), "{err:?}");
}

#[tokio::test]
async fn all_day_block_dominates_and_unblock_is_idempotent() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let block = state
        .blocked_slots
        .create(BlockedSlot {
            id: None,
            date: "2025-03-10".to_string(),
            time_slot: None,
            reason: Default::default(),
            description: None,
            is_all_day: true,
            created_by: None,
            created_at: clock.now_millis(),
        })
        .await
        .unwrap();

    assert!(
        state
            .scheduling
            .available_slots("2025-03-10")
            .await
            .unwrap()
            .is_empty()
    );

    // removing the block restores the day; a second unblock is a no-op
    let id = block.id.as_ref().unwrap().to_string();
    state.blocked_slots.delete(&id).await.unwrap();
    state.blocked_slots.delete(&id).await.unwrap();

    assert_eq!(
        state
            .scheduling
            .available_slots("2025-03-10")
            .await
            .unwrap()
            .len(),
        20
    );
}

#[tokio::test]
async fn single_slot_block_removes_only_that_slot() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    state
        .blocked_slots
        .create(BlockedSlot {
            id: None,
            date: "2025-03-10".to_string(),
            time_slot: Some("09:00".to_string()),
            reason: Default::default(),
            description: Some("staff meeting".to_string()),
            is_all_day: false,
            created_by: None,
            created_at: clock.now_millis(),
        })
        .await
        .unwrap();

    let slots = state.scheduling.available_slots("2025-03-10").await.unwrap();
    assert_eq!(slots.len(), 19);
    assert!(!slots.iter().any(|s| s.time == "09:00"));
}

#[tokio::test]
async fn same_day_minimum_notice_applies_only_today() {
    // Monday 2025-03-10 at 16:00; 2h notice pushes the cutoff to 18:00,
    // past the last 17:30 slot
    let clock = ManualClock::at(2025, 3, 10, 16, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let today = state.scheduling.available_slots("2025-03-10").await.unwrap();
    assert!(today.is_empty());

    let tomorrow = state.scheduling.available_slots("2025-03-11").await.unwrap();
    assert_eq!(tomorrow.len(), 20);

    // and past days never offer anything
    let yesterday = state.scheduling.available_slots("2025-03-09").await.unwrap();
    assert!(yesterday.is_empty());
}

#[tokio::test]
async fn booking_numbers_are_unique_and_immutable() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let a = state
        .bookings
        .create(booking_request("2025-03-10", "09:00", "5551110001"))
        .await
        .unwrap();
    let b = state
        .bookings
        .create(booking_request("2025-03-10", "09:30", "5551110002"))
        .await
        .unwrap();
    assert_ne!(a.booking_number, b.booking_number);

    let id = a.id.as_ref().unwrap().to_string();
    let updated = state.bookings.set_status(&id, "confirmed").await.unwrap();
    assert_eq!(updated.status, BookingStatus::Confirmed);
    assert_eq!(updated.booking_number, a.booking_number);
}

#[tokio::test]
async fn sms_cancel_bypasses_notice_window() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "10:00", "5551234567"))
        .await
        .unwrap();
    let id = booking.id.as_ref().unwrap().to_string();
    state.bookings.set_status(&id, "confirmed").await.unwrap();

    // inside the 24h window, where the web path would refuse
    clock.set(2025, 3, 10, 8, 0);
    state.bookings.handle_inbound_sms("+15551234567", "c").await;

    let after = state
        .bookings
        .find_by_number(&booking.booking_number)
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Cancelled);
    assert_eq!(
        after.cancellation.as_ref().unwrap().cancelled_by,
        CancelActor::Customer
    );
}

#[tokio::test]
async fn sms_confirm_promotes_pending_booking() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "11:00", "8015550123"))
        .await
        .unwrap();

    // country-code prefix on the sender must still match
    state.bookings.handle_inbound_sms("+18015550123", "YES").await;

    let after = state
        .bookings
        .find_by_number(&booking.booking_number)
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn sms_reschedule_flags_without_status_change() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "13:00", "5551234567"))
        .await
        .unwrap();

    state.bookings.handle_inbound_sms("5551234567", "r").await;

    let after = state
        .bookings
        .find_by_number(&booking.booking_number)
        .await
        .unwrap();
    assert_eq!(after.status, BookingStatus::Pending);
    assert!(after.notes.reschedule_requested);
    assert!(after.notes.reschedule_requested_at.is_some());
}

#[tokio::test]
async fn stale_pending_sweep_cancels_unpaid_bookings() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let stale = state
        .bookings
        .create(booking_request("2025-03-10", "09:00", "5551110001"))
        .await
        .unwrap();

    // 25 hours later a fresh booking arrives; only the old one is stale
    clock.set(2025, 3, 2, 13, 0);
    let fresh = state
        .bookings
        .create(booking_request("2025-03-10", "09:30", "5551110002"))
        .await
        .unwrap();

    let worker = HousekeepingWorker::new(state.bookings.clone());
    let cancelled = worker.run_stale_pending_sweep().await.unwrap();
    assert_eq!(cancelled, 1);

    let stale = state
        .bookings
        .find_by_number(&stale.booking_number)
        .await
        .unwrap();
    assert_eq!(stale.status, BookingStatus::Cancelled);
    assert_eq!(
        stale.cancellation.as_ref().unwrap().cancelled_by,
        CancelActor::System
    );

    let fresh = state
        .bookings
        .find_by_number(&fresh.booking_number)
        .await
        .unwrap();
    assert_eq!(fresh.status, BookingStatus::Pending);
}

#[tokio::test]
async fn no_show_sweep_only_touches_confirmed() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let confirmed = state
        .bookings
        .create(booking_request("2025-03-10", "09:00", "5551110001"))
        .await
        .unwrap();
    let confirmed_id = confirmed.id.as_ref().unwrap().to_string();
    state
        .bookings
        .set_status(&confirmed_id, "confirmed")
        .await
        .unwrap();

    let pending = state
        .bookings
        .create(booking_request("2025-03-10", "09:30", "5551110002"))
        .await
        .unwrap();

    // noon, both slots are more than two hours past
    clock.set(2025, 3, 10, 12, 0);

    let worker = HousekeepingWorker::new(state.bookings.clone());
    let marked = worker.run_no_show_sweep().await.unwrap();
    assert_eq!(marked, 1);

    let confirmed = state
        .bookings
        .find_by_number(&confirmed.booking_number)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::NoShow);

    let pending = state
        .bookings
        .find_by_number(&pending.booking_number)
        .await
        .unwrap();
    assert_eq!(pending.status, BookingStatus::Pending);
}

#[tokio::test]
async fn reminder_sweep_logs_attempted_channels() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "09:00", "5551234567"))
        .await
        .unwrap();

    // the day before the appointment
    clock.set(2025, 3, 9, 10, 0);

    let worker = HousekeepingWorker::new(state.bookings.clone());
    let swept = worker.run_reminder_sweep().await.unwrap();
    assert_eq!(swept, 1);

    let after = state
        .bookings
        .find_by_number(&booking.booking_number)
        .await
        .unwrap();
    // guest contact carries both channels
    assert_eq!(after.reminders.len(), 2);
    assert!(after.reminders.iter().all(|r| r.scheduled_for == "2025-03-10"));
}

#[tokio::test]
async fn terminal_status_transitions_are_rejected() {
    let clock = ManualClock::at(2025, 3, 1, 12, 0);
    let (state, _tmp) = test_state(&clock, 2).await;

    let booking = state
        .bookings
        .create(booking_request("2025-03-10", "14:00", "5551234567"))
        .await
        .unwrap();
    let id = booking.id.as_ref().unwrap().to_string();

    let cancelled = state
        .bookings
        .cancel(&id, CancelActor::Admin, Some("shop closed".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    // no resurrecting a cancelled booking
    let err = state.bookings.set_status(&id, "confirmed").await.unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)), "{err:?}");

    // unknown status strings are a validation error
    let err = state.bookings.set_status(&id, "paused").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
}
