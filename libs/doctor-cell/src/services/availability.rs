use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    time_of_day, AvailabilityWindow, AvailabilityWindowInput, DoctorError,
    NewAvailabilityWindow, SetAvailabilityRequest,
};
use crate::store::DoctorStore;

pub struct AvailabilityService {
    store: Arc<dyn DoctorStore>,
    timezone: Tz,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn DoctorStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Windows for a doctor in store order.
    pub async fn get_windows(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Fetching availability for doctor: {}", doctor_id);
        self.store.get_availability_windows(doctor_id).await
    }

    /// Replace every window a doctor has with the submitted set.
    pub async fn set_windows(
        &self,
        doctor_id: Uuid,
        request: SetAvailabilityRequest,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        if self.store.get_doctor(doctor_id).await?.is_none() {
            return Err(DoctorError::NotFound);
        }

        let windows = self.validate_windows(&request.windows)?;
        let stored = self.store.replace_availability_windows(doctor_id, windows).await?;

        info!("Doctor {} now has {} availability windows", doctor_id, stored.len());
        Ok(stored)
    }

    pub fn validate_windows(
        &self,
        inputs: &[AvailabilityWindowInput],
    ) -> Result<Vec<NewAvailabilityWindow>, DoctorError> {
        let mut seen_days = HashSet::new();
        let mut windows = Vec::with_capacity(inputs.len());

        for input in inputs {
            let start_time = self.parse_time(&input.start_time)?;
            let end_time = self.parse_time(&input.end_time)?;

            if start_time >= end_time {
                return Err(DoctorError::InvalidWindow(
                    "Start time must be before end time".to_string(),
                ));
            }

            if let Some(day) = input.day_of_week {
                if day > 6 {
                    return Err(DoctorError::InvalidWindow(
                        "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
                    ));
                }
            }

            if !seen_days.insert(input.day_of_week) {
                return Err(DoctorError::InvalidWindow(match input.day_of_week {
                    Some(day) => format!("More than one window for day {}", day),
                    None => "More than one window for every day".to_string(),
                }));
            }

            windows.push(NewAvailabilityWindow {
                start_time,
                end_time,
                day_of_week: input.day_of_week,
            });
        }

        Ok(windows)
    }

    fn parse_time(&self, raw: &str) -> Result<NaiveTime, DoctorError> {
        time_of_day::parse_in(raw, self.timezone)
            .ok_or_else(|| DoctorError::InvalidWindow(format!("Unparseable time '{}'", raw)))
    }
}
