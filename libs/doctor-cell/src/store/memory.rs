use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AvailabilityStatus, AvailabilityWindow, Doctor, DoctorError, NewAvailabilityWindow,
};
use crate::store::DoctorStore;

/// Process-local store used by the `memory` backend and by tests.
#[derive(Default)]
pub struct InMemoryDoctorStore {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    windows: RwLock<HashMap<Uuid, Vec<AvailabilityWindow>>>,
}

impl InMemoryDoctorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_doctor(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }

    pub async fn insert_window(&self, window: AvailabilityWindow) {
        self.windows
            .write()
            .await
            .entry(window.doctor_id)
            .or_default()
            .push(window);
    }
}

#[async_trait]
impl DoctorStore for InMemoryDoctorStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }

    async fn get_availability_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        Ok(self
            .windows
            .read()
            .await
            .get(&doctor_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_availability_windows(
        &self,
        doctor_id: Uuid,
        windows: Vec<NewAvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let now = Utc::now();
        let stored: Vec<AvailabilityWindow> = windows
            .into_iter()
            .map(|w| AvailabilityWindow {
                id: Uuid::new_v4(),
                doctor_id,
                start_time: w.start_time,
                end_time: w.end_time,
                day_of_week: w.day_of_week,
                status: AvailabilityStatus::Available,
                created_at: Some(now),
            })
            .collect();

        self.windows.write().await.insert(doctor_id, stored.clone());
        Ok(stored)
    }
}
