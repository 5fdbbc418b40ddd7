// libs/appointment-cell/tests/slots_test.rs

mod common;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use proptest::prelude::*;
use uuid::Uuid;

use appointment_cell::services::{overlaps, SlotGenerator};
use appointment_cell::{Appointment, AppointmentStatus, DaySlots};
use common::{appointment, at, doctor, time, window, Clinic};
use doctor_cell::{AvailabilityWindow, VerificationStatus};
use shared_config::SchedulingConfig;

fn generator() -> SlotGenerator {
    SlotGenerator::new(&SchedulingConfig::default())
}

fn morning_window(doctor_id: Uuid) -> Vec<AvailabilityWindow> {
    vec![window(doctor_id, time(9, 0), time(12, 0), None)]
}

fn starts(day: &DaySlots) -> Vec<String> {
    day.slots
        .iter()
        .map(|slot| slot.start_time.format("%H:%M").to_string())
        .collect()
}

#[test]
fn empty_morning_yields_six_slots() {
    let doctor_id = Uuid::new_v4();
    let now = at(2026, 10, 19, 8, 0);

    let days = generator().generate(&morning_window(doctor_id), &[], now);

    assert_eq!(days.len(), 4);
    assert_eq!(starts(&days[0]), vec!["09:00", "09:30", "10:00", "10:30", "11:00", "11:30"]);
    assert_eq!(days[0].available_count, 6);
    assert_eq!(days[0].slots.last().unwrap().end_time, at(2026, 10, 19, 12, 0));
}

#[test]
fn booked_slot_is_left_out() {
    let doctor_id = Uuid::new_v4();
    let now = at(2026, 10, 19, 8, 0);
    let existing = vec![appointment(
        doctor_id,
        at(2026, 10, 19, 10, 0),
        at(2026, 10, 19, 10, 30),
        AppointmentStatus::Scheduled,
    )];

    let days = generator().generate(&morning_window(doctor_id), &existing, now);

    assert_eq!(starts(&days[0]), vec!["09:00", "09:30", "10:30", "11:00", "11:30"]);
    assert_eq!(days[0].available_count, 5);
    // Other days are unaffected
    assert_eq!(days[1].available_count, 6);
}

#[test]
fn cancelled_appointment_frees_its_slot() {
    let doctor_id = Uuid::new_v4();
    let now = at(2026, 10, 19, 8, 0);
    let existing = vec![appointment(
        doctor_id,
        at(2026, 10, 19, 10, 0),
        at(2026, 10, 19, 10, 30),
        AppointmentStatus::Cancelled,
    )];

    let days = generator().generate(&morning_window(doctor_id), &existing, now);

    assert_eq!(days[0].available_count, 6);
}

#[test]
fn lookahead_suppresses_imminent_slot() {
    let doctor_id = Uuid::new_v4();
    let now = at(2026, 10, 19, 9, 10);

    let days = generator().generate(&morning_window(doctor_id), &[], now);

    // 09:00 < 09:25, 09:30 >= 09:25
    assert_eq!(starts(&days[0]), vec!["09:30", "10:00", "10:30", "11:00", "11:30"]);
}

#[test]
fn slot_starting_exactly_at_lookahead_is_kept() {
    let doctor_id = Uuid::new_v4();
    let now = at(2026, 10, 19, 9, 15);

    let days = generator().generate(&morning_window(doctor_id), &[], now);

    assert_eq!(starts(&days[0])[0], "09:30");

    let now = at(2026, 10, 19, 9, 45);
    let days = generator().generate(&morning_window(doctor_id), &[], now);
    assert_eq!(starts(&days[0])[0], "10:00");
}

#[test]
fn last_slot_may_end_at_window_close_but_not_past_it() {
    let doctor_id = Uuid::new_v4();
    let windows = vec![window(doctor_id, time(9, 0), time(10, 45), None)];

    let days = generator().generate(&windows, &[], at(2026, 10, 19, 6, 0));

    assert_eq!(starts(&days[0]), vec!["09:00", "09:30", "10:00"]);
}

#[test]
fn labels_and_day_keys() {
    let doctor_id = Uuid::new_v4();
    let days = generator().generate(&morning_window(doctor_id), &[], at(2026, 10, 19, 8, 0));

    assert_eq!(days[0].date, "2026-10-19");
    assert_eq!(days[0].display_date, "Monday, October 19");
    assert_eq!(days[3].date, "2026-10-22");
    assert_eq!(days[0].slots[0].formatted, "9:00 AM - 9:30 AM");
    assert_eq!(days[0].slots[5].formatted, "11:30 AM - 12:00 PM");
    assert_eq!(days[0].slots[0].day, "Monday, October 19");
}

#[test]
fn generation_is_idempotent() {
    let doctor_id = Uuid::new_v4();
    let now = at(2026, 10, 19, 9, 40);
    let existing = vec![appointment(
        doctor_id,
        at(2026, 10, 20, 11, 0),
        at(2026, 10, 20, 11, 30),
        AppointmentStatus::Scheduled,
    )];

    let first = generator().generate(&morning_window(doctor_id), &existing, now);
    let second = generator().generate(&morning_window(doctor_id), &existing, now);

    assert_eq!(first, second);
}

#[test]
fn no_usable_window_means_no_days() {
    let doctor_id = Uuid::new_v4();
    let inverted = vec![window(doctor_id, time(12, 0), time(9, 0), None)];

    assert!(generator().generate(&[], &[], at(2026, 10, 19, 8, 0)).is_empty());
    assert!(generator().generate(&inverted, &[], at(2026, 10, 19, 8, 0)).is_empty());
}

#[test]
fn past_days_are_listed_empty() {
    let doctor_id = Uuid::new_v4();
    // Today's window has already closed
    let days = generator().generate(&morning_window(doctor_id), &[], at(2026, 10, 19, 18, 0));

    assert_eq!(days.len(), 4);
    assert!(days[0].slots.is_empty());
    assert_eq!(days[0].available_count, 0);
    assert_eq!(days[1].available_count, 6);
}

#[test]
fn weekday_window_overrides_default_window() {
    let doctor_id = Uuid::new_v4();
    let windows = vec![
        window(doctor_id, time(13, 0), time(15, 0), None),
        // Monday only
        window(doctor_id, time(9, 0), time(10, 0), Some(1)),
    ];

    // 2026-10-19 is a Monday
    let days = generator().generate(&windows, &[], at(2026, 10, 19, 7, 0));

    assert_eq!(starts(&days[0]), vec!["09:00", "09:30"]);
    assert_eq!(starts(&days[1]), vec!["13:00", "13:30", "14:00", "14:30"]);
}

#[test]
fn weekday_only_schedule_keeps_other_days_empty() {
    let doctor_id = Uuid::new_v4();
    // Wednesday only
    let windows = vec![window(doctor_id, time(9, 0), time(10, 0), Some(3))];

    let days = generator().generate(&windows, &[], at(2026, 10, 19, 7, 0));

    assert_eq!(days.len(), 4);
    let counts: Vec<usize> = days.iter().map(|d| d.available_count).collect();
    assert_eq!(counts, vec![0, 0, 2, 0]);
}

#[test]
fn windows_are_anchored_in_clinic_timezone() {
    let doctor_id = Uuid::new_v4();
    let tz: Tz = "America/New_York".parse().unwrap();
    let generator = SlotGenerator::new(&SchedulingConfig {
        timezone: tz,
        ..SchedulingConfig::default()
    });
    let windows = vec![window(doctor_id, time(9, 0), time(10, 0), None)];

    // 08:00 EDT
    let days = generator.generate(&windows, &[], at(2026, 10, 19, 12, 0));

    assert_eq!(days[0].date, "2026-10-19");
    assert_eq!(days[0].slots[0].start_time, at(2026, 10, 19, 13, 0));
    assert_eq!(days[0].slots[0].formatted, "9:00 AM - 9:30 AM");
}

#[test]
fn local_date_decides_today() {
    let doctor_id = Uuid::new_v4();
    let tz: Tz = "Asia/Tokyo".parse().unwrap();
    let generator = SlotGenerator::new(&SchedulingConfig {
        timezone: tz,
        ..SchedulingConfig::default()
    });

    // 2026-10-19 20:00 UTC is already 2026-10-20 in Tokyo
    let days = generator.generate(&morning_window(doctor_id), &[], at(2026, 10, 19, 20, 0));

    assert_eq!(days[0].date, "2026-10-20");
    assert_eq!(days[3].date, "2026-10-23");
}

#[test]
fn fall_back_day_walks_real_time() {
    let doctor_id = Uuid::new_v4();
    let tz: Tz = "America/New_York".parse().unwrap();
    let generator = SlotGenerator::new(&SchedulingConfig {
        timezone: tz,
        ..SchedulingConfig::default()
    });
    let windows = vec![window(doctor_id, time(0, 0), time(4, 0), None)];

    // 2026-11-01 has 25 hours in New York; 00:00 EDT to 04:00 EST is five hours
    let now = tz.with_ymd_and_hms(2026, 10, 31, 23, 0, 0).unwrap().with_timezone(&Utc);
    let days = generator.generate(&windows, &[], now);

    let nov_first = days.iter().find(|d| d.date == "2026-11-01").unwrap();
    assert_eq!(nov_first.available_count, 10);
    assert!(nov_first
        .slots
        .windows(2)
        .all(|pair| pair[0].end_time == pair[1].start_time));
}

// ---------------------------------------------------------------------------
// Through the service: doctor lookup and stored appointments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn service_reports_unknown_and_unverified_doctors_as_failures() {
    let clinic = Clinic::new(10).await;
    let pending_id = Uuid::new_v4();
    clinic
        .doctors
        .insert_doctor(doctor(pending_id, VerificationStatus::Pending))
        .await;
    let service = clinic.availability();

    for id in [Uuid::new_v4(), pending_id] {
        let response = service.available_slots(id, at(2026, 10, 19, 8, 0)).await.unwrap();
        assert!(!response.success);
        assert!(response.days.is_empty());
        assert!(response.error.is_some());
        assert!(response.doctor.is_none());
    }
}

#[tokio::test]
async fn service_reports_missing_schedule_as_empty_success() {
    let clinic = Clinic::new(10).await;
    let doctor_id = Uuid::new_v4();
    clinic
        .doctors
        .insert_doctor(doctor(doctor_id, VerificationStatus::Verified))
        .await;

    let response = clinic
        .availability()
        .available_slots(doctor_id, at(2026, 10, 19, 8, 0))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.days.is_empty());
    assert!(response.message.is_some());
    assert_eq!(response.doctor.unwrap().name, "Ada Lovelace");
}

#[tokio::test]
async fn service_blocks_slots_booked_long_before_the_horizon() {
    let clinic = Clinic::new(10).await;
    // Created a week before it occurs
    clinic
        .appointments
        .insert(appointment(
            clinic.doctor_id,
            at(2026, 10, 21, 14, 0),
            at(2026, 10, 21, 14, 30),
            AppointmentStatus::Scheduled,
        ))
        .await;

    let response = clinic
        .availability()
        .available_slots(clinic.doctor_id, at(2026, 10, 19, 8, 0))
        .await
        .unwrap();

    assert!(response.success);
    let wednesday = &response.days[2];
    assert_eq!(wednesday.date, "2026-10-21");
    assert_eq!(wednesday.available_count, 15);
    assert!(wednesday
        .slots
        .iter()
        .all(|slot| slot.start_time != at(2026, 10, 21, 14, 0)));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn arb_appointments(doctor_id: Uuid) -> impl Strategy<Value = Vec<Appointment>> {
    prop::collection::vec((0i64..(5 * 24 * 4), 1i64..8, any::<bool>()), 0..12).prop_map(
        move |specs| {
            specs
                .into_iter()
                .map(|(quarter, length, scheduled)| {
                    let start = at(2026, 10, 19, 0, 0) + Duration::minutes(quarter * 15);
                    let status = if scheduled {
                        AppointmentStatus::Scheduled
                    } else {
                        AppointmentStatus::Cancelled
                    };
                    appointment(doctor_id, start, start + Duration::minutes(length * 15), status)
                })
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generated_slots_respect_every_invariant(
        now_offset in 0i64..(24 * 60),
        start_quarter in 0u32..60,
        length_quarters in 1u32..40,
        existing in arb_appointments(Uuid::nil()),
    ) {
        let doctor_id = Uuid::nil();
        let start = time(0, 0) + Duration::minutes(i64::from(start_quarter) * 15);
        let end_minutes = (i64::from(start_quarter) + i64::from(length_quarters)) * 15;
        let end = time(0, 0) + Duration::minutes(end_minutes.min(23 * 60 + 59));
        prop_assume!(start < end);

        let windows = vec![window(doctor_id, start, end, None)];
        let now = at(2026, 10, 19, 0, 0) + Duration::minutes(now_offset);
        let horizon_end = at(2026, 10, 23, 0, 0);

        let days = generator().generate(&windows, &existing, now);
        prop_assert_eq!(days.len(), 4);

        for day in &days {
            prop_assert_eq!(day.available_count, day.slots.len());
            let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").unwrap();
            let window_start = Utc.from_utc_datetime(&date.and_time(start));

            for slot in &day.slots {
                prop_assert_eq!(slot.end_time - slot.start_time, Duration::minutes(30));
                prop_assert_eq!((slot.start_time - window_start).num_minutes() % 30, 0);
                prop_assert!(slot.start_time >= now + Duration::minutes(15));
                prop_assert!(slot.start_time >= now && slot.end_time <= horizon_end);

                for booked in existing.iter().filter(|a| a.is_scheduled()) {
                    prop_assert!(!overlaps(&slot.interval(), &booked.interval()));
                }
            }
        }
    }
}
