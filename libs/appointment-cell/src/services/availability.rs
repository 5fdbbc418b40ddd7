// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::DoctorService;
use doctor_cell::{DoctorError, DoctorStore};
use shared_config::SchedulingConfig;

use crate::models::{AppointmentError, DoctorSlotsResponse};
use crate::services::slots::SlotGenerator;
use crate::store::AppointmentStore;

/// Read side of booking: what can a patient pick right now.
pub struct AvailabilityService {
    doctors: DoctorService,
    doctor_store: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
    generator: SlotGenerator,
}

impl AvailabilityService {
    pub fn new(
        doctor_store: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            doctors: DoctorService::new(Arc::clone(&doctor_store)),
            doctor_store,
            appointments,
            generator: SlotGenerator::new(config),
        }
    }

    /// Bookable slots for `doctor_id` over the horizon starting at `now`.
    ///
    /// An unknown or unverified doctor is a failed response, not an error;
    /// a doctor without a schedule is a successful, empty one.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DoctorSlotsResponse, AppointmentError> {
        let doctor = match self.doctors.get_verified_doctor(doctor_id).await {
            Ok(doctor) => doctor,
            Err(DoctorError::NotFound) | Err(DoctorError::NotVerified) => {
                warn!("Slots requested for unavailable doctor {}", doctor_id);
                return Ok(DoctorSlotsResponse::failure("Doctor not found or not verified"));
            }
            Err(e) => return Err(e.into()),
        };

        let windows = self.doctor_store.get_availability_windows(doctor_id).await?;
        if !windows.iter().any(|w| w.is_available()) {
            info!("Doctor {} has no availability configured", doctor_id);
            return Ok(DoctorSlotsResponse::no_schedule(doctor.summary()));
        }

        let horizon = self.generator.horizon(now);
        let existing = self
            .appointments
            .find_scheduled_in_range(doctor_id, horizon.start, horizon.end)
            .await?;

        debug!(
            "Generating slots for doctor {} with {} existing appointments",
            doctor_id,
            existing.len()
        );

        let days = self.generator.generate(&windows, &existing, now);
        Ok(DoctorSlotsResponse::available(doctor.summary(), days))
    }
}
