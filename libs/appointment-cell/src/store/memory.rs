use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Account, Appointment, AppointmentError, AppointmentStatus, NewAppointment};
use crate::services::conflict::overlaps;
use crate::store::{AppointmentStore, CreditLedger};

/// Process-local appointment table used by the `memory` backend and by tests.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row as-is, bypassing the overlap guard.
    pub async fn insert(&self, appointment: Appointment) {
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment);
    }

    pub async fn all(&self) -> Vec<Appointment> {
        let mut rows: Vec<Appointment> = self.appointments.read().await.values().cloned().collect();
        rows.sort_by_key(|a| a.start_time);
        rows
    }

    fn newest_first(mut rows: Vec<Appointment>) -> Vec<Appointment> {
        rows.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        rows
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find_scheduled_in_range(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut rows: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.is_scheduled())
            .filter(|a| a.start_time < to && from < a.end_time)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_time);
        Ok(rows)
    }

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.appointments.read().await.get(&appointment_id).cloned())
    }

    async fn insert_scheduled(&self, new: NewAppointment) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;

        let candidate = new.interval();
        let taken = appointments
            .values()
            .any(|a| a.doctor_id == new.doctor_id && a.is_scheduled() && overlaps(&candidate, &a.interval()));
        if taken {
            return Err(AppointmentError::SlotConflict);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: new.id,
            doctor_id: new.doctor_id,
            patient_id: new.patient_id,
            start_time: new.start_time,
            end_time: new.end_time,
            status: AppointmentStatus::Scheduled,
            description: new.description,
            price_credits: new.price_credits,
            video_session_id: new.video_session_id,
            video_session_token: None,
            created_at: now,
            updated_at: now,
        };
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;

        if appointment.status != from {
            return Err(AppointmentError::InvalidStatusTransition(appointment.status));
        }

        appointment.status = to;
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn set_video_token(
        &self,
        appointment_id: Uuid,
        token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or(AppointmentError::NotFound)?;

        appointment.video_session_token = Some(token.to_string());
        appointment.updated_at = Utc::now();
        Ok(appointment.clone())
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(rows))
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let rows = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(rows))
    }
}

/// Process-local balances used by the `memory` backend and by tests.
#[derive(Default)]
pub struct InMemoryCreditLedger {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryCreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, id: Uuid, role: &str, credits: i64) {
        self.accounts.write().await.insert(
            id,
            Account {
                id,
                role: Some(role.to_string()),
                credits,
            },
        );
    }

    pub async fn balance(&self, id: Uuid) -> Option<i64> {
        self.accounts.read().await.get(&id).map(|a| a.credits)
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<Account>, AppointmentError> {
        Ok(self.accounts.read().await.get(&user_id).cloned())
    }

    async fn transfer(&self, from: Uuid, to: Uuid, amount: i64) -> Result<(), AppointmentError> {
        let mut accounts = self.accounts.write().await;

        let missing = |id: Uuid| AppointmentError::DependencyFailure(format!("Credit account {} not found", id));
        let available = accounts.get(&from).map(|a| a.credits).ok_or_else(|| missing(from))?;
        if !accounts.contains_key(&to) {
            return Err(missing(to));
        }
        if available < amount {
            return Err(AppointmentError::InsufficientCredit {
                required: amount,
                available,
            });
        }

        if let Some(account) = accounts.get_mut(&from) {
            account.credits -= amount;
        }
        if let Some(account) = accounts.get_mut(&to) {
            account.credits += amount;
        }
        Ok(())
    }
}
