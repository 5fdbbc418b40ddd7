use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Doctor, DoctorError};
use crate::store::DoctorStore;

pub struct DoctorService {
    store: Arc<dyn DoctorStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn DoctorStore>) -> Self {
        Self { store }
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.store
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Doctors must be verified before patients can see or book their slots.
    pub async fn get_verified_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;

        if !doctor.is_verified() {
            warn!("Doctor {} is {:?}, refusing scheduling access", doctor_id, doctor.verification_status);
            return Err(DoctorError::NotVerified);
        }

        debug!("Doctor {} verified", doctor_id);
        Ok(doctor)
    }
}
