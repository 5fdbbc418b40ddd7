use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{Account, Appointment, AppointmentError, AppointmentStatus, NewAppointment};
use crate::store::{AppointmentStore, CreditLedger};

/// PostgREST-backed store over the `appointments` table.
///
/// The table is expected to carry an exclusion constraint over
/// `(doctor_id, tstzrange(start_time, end_time))` for SCHEDULED rows; its
/// violation is reported as `SlotConflict`.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None, None)
            .await
            .map_err(db_error)?;
        parse_rows(rows)
    }

    async fn patch_one(&self, path: &str, body: Value) -> Result<Option<Appointment>, AppointmentError> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                path,
                None,
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(db_error)?;
        Ok(parse_rows(rows)?.into_iter().next())
    }
}

fn db_error(e: anyhow::Error) -> AppointmentError {
    AppointmentError::Database(e.to_string())
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Appointment>, _>>()
        .map_err(|e| AppointmentError::Database(format!("Failed to parse appointments: {}", e)))
}

fn timestamp(value: DateTime<Utc>) -> String {
    urlencoding::encode(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true)).into_owned()
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find_scheduled_in_range(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching scheduled appointments for doctor {} between {} and {}", doctor_id, from, to);

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=eq.SCHEDULED&start_time=lt.{}&end_time=gt.{}&order=start_time.asc",
            doctor_id,
            timestamp(to),
            timestamp(from)
        );
        self.fetch(&path).await
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", appointment_id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn insert_scheduled(&self, new: NewAppointment) -> Result<Appointment, AppointmentError> {
        debug!("Inserting appointment {} for doctor {}", new.id, new.doctor_id);

        let body = json!({
            "id": new.id,
            "doctor_id": new.doctor_id,
            "patient_id": new.patient_id,
            "start_time": new.start_time.to_rfc3339(),
            "end_time": new.end_time.to_rfc3339(),
            "status": AppointmentStatus::Scheduled,
            "description": new.description,
            "price_credits": new.price_credits,
            "video_session_id": new.video_session_id,
        });

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                None,
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| match e.downcast_ref::<SupabaseError>() {
                Some(SupabaseError::Conflict(msg)) => {
                    warn!("Exclusion constraint rejected appointment {}: {}", new.id, msg);
                    AppointmentError::SlotConflict
                }
                _ => db_error(e),
            })?;

        parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("Insert returned no rows".to_string()))
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        // Filtering on the current status makes the update a compare-and-set
        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", appointment_id, from);
        let body = json!({ "status": to, "updated_at": Utc::now().to_rfc3339() });

        match self.patch_one(&path, body).await? {
            Some(appointment) => Ok(appointment),
            None => match self.get(appointment_id).await? {
                Some(current) => Err(AppointmentError::InvalidStatusTransition(current.status)),
                None => Err(AppointmentError::NotFound),
            },
        }
    }

    async fn set_video_token(
        &self,
        appointment_id: Uuid,
        token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let body = json!({ "video_session_token": token, "updated_at": Utc::now().to_rfc3339() });

        self.patch_one(&path, body)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?patient_id=eq.{}&order=start_time.desc", patient_id);
        self.fetch(&path).await
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?doctor_id=eq.{}&order=start_time.desc", doctor_id);
        self.fetch(&path).await
    }
}

/// Balances live on the `users` table; transfers go through the
/// `transfer_credits` function so both rows change in one transaction.
/// The function returns the new balances as JSON and raises
/// `insufficient_credits` when the payer cannot cover the amount.
pub struct SupabaseCreditLedger {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseCreditLedger {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl CreditLedger for SupabaseCreditLedger {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<Account>, AppointmentError> {
        let path = format!("/rest/v1/users?id=eq.{}&select=id,role,credits&limit=1", user_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(db_error)?;

        rows.into_iter()
            .next()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppointmentError::Database(format!("Failed to parse account: {}", e)))
            })
            .transpose()
    }

    async fn transfer(&self, from: Uuid, to: Uuid, amount: i64) -> Result<(), AppointmentError> {
        debug!("Transferring {} credits from {} to {}", amount, from, to);

        let body = json!({
            "from_user": from,
            "to_user": to,
            "amount": amount,
        });

        let result: Result<Value, anyhow::Error> = self
            .supabase
            .request(Method::POST, "/rest/v1/rpc/transfer_credits", None, Some(body))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("insufficient_credits") => {
                let available = self
                    .get_account(from)
                    .await?
                    .map(|account| account.credits)
                    .unwrap_or(0);
                Err(AppointmentError::InsufficientCredit {
                    required: amount,
                    available,
                })
            }
            Err(e) => Err(AppointmentError::DependencyFailure(format!(
                "Credit transfer failed: {}",
                e
            ))),
        }
    }
}
