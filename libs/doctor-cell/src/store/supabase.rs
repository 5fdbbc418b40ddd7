use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityRow, AvailabilityWindow, Doctor, DoctorError, NewAvailabilityWindow};
use crate::store::DoctorStore;

/// PostgREST-backed store over the `doctors` and `availabilities` tables.
///
/// Schedules are replaced through the `replace_availability` function, which
/// deletes and inserts a doctor's windows in one transaction and returns the
/// new rows.
pub struct SupabaseDoctorStore {
    supabase: Arc<SupabaseClient>,
    timezone: Tz,
}

impl SupabaseDoctorStore {
    pub fn new(supabase: Arc<SupabaseClient>, timezone: Tz) -> Self {
        Self { supabase, timezone }
    }

    fn parse_windows(&self, rows: Vec<Value>) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value::<AvailabilityRow>(row)
                    .map_err(|e| db_error(format!("Failed to parse availability: {}", e)))?
                    .into_window(self.timezone)
            })
            .collect()
    }
}

fn db_error(e: impl std::fmt::Display) -> DoctorError {
    DoctorError::Database(e.to_string())
}

#[async_trait]
impl DoctorStore for SupabaseDoctorStore {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}&limit=1", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(db_error)?;

        result
            .into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(|e| db_error(format!("Failed to parse doctor: {}", e))))
            .transpose()
    }

    async fn get_availability_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Fetching availability windows for doctor: {}", doctor_id);

        let path = format!(
            "/rest/v1/availabilities?doctor_id=eq.{}&order=created_at.asc",
            doctor_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(db_error)?;

        self.parse_windows(result)
    }

    async fn replace_availability_windows(
        &self,
        doctor_id: Uuid,
        windows: Vec<NewAvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Replacing {} availability windows for doctor {}", windows.len(), doctor_id);

        let rows: Vec<Value> = windows
            .iter()
            .map(|w| {
                json!({
                    "start_time": w.start_time.format("%H:%M:%S").to_string(),
                    "end_time": w.end_time.format("%H:%M:%S").to_string(),
                    "day_of_week": w.day_of_week,
                })
            })
            .collect();

        let body = json!({
            "doctor_id": doctor_id,
            "windows": rows,
        });

        let created: Vec<Value> = self
            .supabase
            .request(Method::POST, "/rest/v1/rpc/replace_availability", None, Some(body))
            .await
            .map_err(db_error)?;

        self.parse_windows(created)
    }
}
