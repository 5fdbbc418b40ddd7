// libs/appointment-cell/src/services/slots.rs
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use doctor_cell::{window_for_date, AvailabilityWindow};
use shared_config::SchedulingConfig;

use crate::models::{Appointment, DaySlots, Interval, Slot};
use crate::services::conflict::has_conflict;

/// Turns recurring availability windows into concrete bookable slots.
///
/// Pure: the same windows, appointments and `now` always yield the same days.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    slot_duration: Duration,
    lookahead: Duration,
    horizon_days: u32,
    timezone: Tz,
}

impl SlotGenerator {
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            slot_duration: Duration::minutes(config.slot_duration_minutes.max(1)),
            lookahead: Duration::minutes(config.lookahead_minutes.max(0)),
            horizon_days: config.horizon_days.max(1),
            timezone: config.timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Clinic-local calendar dates covered by a generation run at `now`, today first.
    pub fn horizon_dates(&self, now: DateTime<Utc>) -> Vec<NaiveDate> {
        let today = now.with_timezone(&self.timezone).date_naive();
        today
            .iter_days()
            .take(self.horizon_days as usize)
            .collect()
    }

    /// `[now, end of the last horizon day)`: the span whose appointments can block a slot.
    pub fn horizon(&self, now: DateTime<Utc>) -> Interval {
        let last = self
            .horizon_dates(now)
            .last()
            .copied()
            .unwrap_or_else(|| now.with_timezone(&self.timezone).date_naive());
        let end = last
            .succ_opt()
            .zip(NaiveTime::from_hms_opt(0, 0, 0))
            .and_then(|(next, midnight)| self.anchor(next, midnight))
            .unwrap_or(now + Duration::days(i64::from(self.horizon_days)));

        Interval {
            start: now,
            end: end.max(now + Duration::seconds(1)),
        }
    }

    /// Slots for every horizon day.
    ///
    /// A doctor without any usable window gets no days at all; a day that
    /// simply has nothing left to book is still listed with an empty slot list.
    pub fn generate(
        &self,
        windows: &[AvailabilityWindow],
        existing: &[Appointment],
        now: DateTime<Utc>,
    ) -> Vec<DaySlots> {
        if !windows.iter().any(AvailabilityWindow::is_available) {
            return Vec::new();
        }

        let earliest_start = now + self.lookahead;

        self.horizon_dates(now)
            .into_iter()
            .map(|date| {
                let slots = window_for_date(windows, date)
                    .map(|window| self.slots_for_day(window, date, existing, earliest_start))
                    .unwrap_or_default();

                debug!("Generated {} slots for {}", slots.len(), date);

                DaySlots {
                    date: date.format("%Y-%m-%d").to_string(),
                    display_date: day_label(date),
                    available_count: slots.len(),
                    slots,
                }
            })
            .collect()
    }

    fn slots_for_day(
        &self,
        window: &AvailabilityWindow,
        date: NaiveDate,
        existing: &[Appointment],
        earliest_start: DateTime<Utc>,
    ) -> Vec<Slot> {
        let (Some(day_start), Some(day_end)) = (
            self.anchor(date, window.start_time),
            self.anchor(date, window.end_time),
        ) else {
            return Vec::new();
        };

        let day = day_label(date);
        let mut slots = Vec::new();
        let mut current = day_start;

        loop {
            let next = current + self.slot_duration;
            if next > day_end {
                break;
            }

            let candidate = Interval {
                start: current,
                end: next,
            };

            if current >= earliest_start && !has_conflict(&candidate, existing) {
                slots.push(Slot {
                    start_time: current,
                    end_time: next,
                    formatted: format!("{} - {}", self.clock(current), self.clock(next)),
                    day: day.clone(),
                });
            }

            current = next;
        }

        slots
    }

    /// Place a wall-clock time on `date` in clinic time.
    ///
    /// Times skipped by a DST gap move forward one hour; repeated times take
    /// the earlier instant.
    fn anchor(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        let local = date.and_time(time);
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => self
                .timezone
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    fn clock(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.timezone)
            .format("%-I:%M %p")
            .to_string()
    }
}

fn day_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}
