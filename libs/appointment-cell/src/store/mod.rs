use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, Appointment, AppointmentError, AppointmentStatus, NewAppointment};

pub mod memory;
pub mod supabase;

pub use memory::{InMemoryAppointmentStore, InMemoryCreditLedger};
pub use supabase::{SupabaseAppointmentStore, SupabaseCreditLedger};

/// Persistence seam for appointments.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Scheduled appointments of one doctor whose occurrence overlaps `[from, to)`,
    /// earliest first.
    async fn find_scheduled_in_range(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Insert a SCHEDULED row. Fails with `SlotConflict` if another scheduled
    /// appointment of the same doctor overlaps it at write time.
    async fn insert_scheduled(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError>;

    /// Move an appointment from `from` to `to`, failing if it is no longer in `from`.
    async fn update_status(
        &self,
        appointment_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError>;

    async fn set_video_token(
        &self,
        appointment_id: Uuid,
        token: &str,
    ) -> Result<Appointment, AppointmentError>;

    /// Newest first.
    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    /// Newest first.
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;
}

/// Prepaid credit balances.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<Account>, AppointmentError>;

    /// Debit `from` and credit `to` as one step. Fails with `InsufficientCredit`
    /// without touching either balance when `from` cannot cover `amount`.
    async fn transfer(&self, from: Uuid, to: Uuid, amount: i64) -> Result<(), AppointmentError>;
}
