// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::services::DoctorService;
use doctor_cell::DoctorStore;
use shared_config::SchedulingConfig;
use video_conferencing_cell::{
    JoinTokenSigner, ParticipantRole, SessionContext, VideoSessionProvider,
};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, NewAppointment,
    ValidatedBooking, VideoJoinResponse,
};
use crate::services::conflict::find_conflicts;
use crate::store::{AppointmentStore, CreditLedger};

/// Join tokens stay valid this long after the appointment ends.
const JOIN_TOKEN_GRACE_MINUTES: i64 = 60;

/// Write side of booking plus the appointment lifecycle.
pub struct BookingService {
    doctors: DoctorService,
    appointments: Arc<dyn AppointmentStore>,
    ledger: Arc<dyn CreditLedger>,
    video: Arc<dyn VideoSessionProvider>,
    tokens: JoinTokenSigner,
    price_credits: i64,
    join_window: Duration,
    doctor_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BookingService {
    pub fn new(
        doctor_store: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
        ledger: Arc<dyn CreditLedger>,
        video: Arc<dyn VideoSessionProvider>,
        tokens: JoinTokenSigner,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            doctors: DoctorService::new(doctor_store),
            appointments,
            ledger,
            video,
            tokens,
            price_credits: config.appointment_price_credits,
            join_window: Duration::minutes(config.video_join_window_minutes),
            doctor_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn price_credits(&self) -> i64 {
        self.price_credits
    }

    /// Book `request` for `patient_id`.
    ///
    /// The slot is re-checked against the doctor's current appointments while
    /// holding that doctor's booking lock, and the row is written last so no
    /// failure leaves credits moved without an appointment.
    #[instrument(skip(self, request), fields(doctor_id = tracing::field::Empty))]
    pub async fn book(
        &self,
        patient_id: Uuid,
        request: &BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let booking = request.validate(now)?;
        tracing::Span::current().record("doctor_id", tracing::field::display(booking.doctor_id));

        if booking.doctor_id == patient_id {
            return Err(AppointmentError::InvalidInput(
                "Doctors cannot book appointments with themselves".to_string(),
            ));
        }

        let doctor = self.doctors.get_verified_doctor(booking.doctor_id).await?;

        let account = self
            .ledger
            .get_account(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;
        if account.credits < self.price_credits {
            return Err(AppointmentError::InsufficientCredit {
                required: self.price_credits,
                available: account.credits,
            });
        }

        let lock = self.doctor_lock(doctor.id).await;
        let result = {
            let _guard = lock.lock().await;
            self.book_locked(doctor.id, patient_id, booking).await
        };
        drop(lock);
        self.release_doctor_lock(doctor.id).await;

        result
    }

    // Runs with the doctor's booking lock held.
    async fn book_locked(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        booking: ValidatedBooking,
    ) -> Result<Appointment, AppointmentError> {
        let price = self.price_credits;

        let existing = self
            .appointments
            .find_scheduled_in_range(doctor_id, booking.interval.start, booking.interval.end)
            .await?;
        let conflicts = find_conflicts(&booking.interval, &existing);
        if !conflicts.is_empty() {
            warn!(
                "Slot {} - {} for doctor {} already taken by {} appointment(s)",
                booking.interval.start,
                booking.interval.end,
                doctor_id,
                conflicts.len()
            );
            return Err(AppointmentError::SlotConflict);
        }

        let appointment_id = Uuid::new_v4();
        let session = self
            .video
            .create_session(&SessionContext {
                appointment_id,
                doctor_id,
                patient_id,
                start_time: booking.interval.start,
                end_time: booking.interval.end,
            })
            .await
            .map_err(|e| {
                error!("Video session provisioning failed for appointment {}: {}", appointment_id, e);
                AppointmentError::DependencyFailure(format!("Failed to create video session: {}", e))
            })?;

        if price > 0 {
            self.ledger
                .transfer(patient_id, doctor_id, price)
                .await
                .map_err(|e| match e {
                    AppointmentError::InsufficientCredit { .. } => e,
                    other => {
                        error!("Credit transfer failed for appointment {}: {}", appointment_id, other);
                        AppointmentError::DependencyFailure(format!("Failed to deduct credits: {}", other))
                    }
                })?;
        }

        let new_appointment = NewAppointment {
            id: appointment_id,
            doctor_id,
            patient_id,
            start_time: booking.interval.start,
            end_time: booking.interval.end,
            description: booking.description,
            price_credits: price,
            video_session_id: Some(session.session_id),
        };

        match self.appointments.insert_scheduled(new_appointment).await {
            Ok(appointment) => {
                info!(
                    "Booked appointment {} with doctor {} at {}",
                    appointment.id, appointment.doctor_id, appointment.start_time
                );
                Ok(appointment)
            }
            Err(e) => {
                warn!("Persisting appointment {} failed, refunding patient: {}", appointment_id, e);
                self.refund(doctor_id, patient_id, price, appointment_id).await;
                Err(e)
            }
        }
    }

    /// Cancel a scheduled appointment and return what the patient paid.
    ///
    /// Credits move back first and the status flips last. If the flip fails
    /// the refund is reversed.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.participant_view(appointment_id, actor_id).await?;
        ensure_transition(&appointment, AppointmentStatus::Cancelled)?;

        let paid = appointment.price_credits;
        if paid > 0 {
            self.ledger
                .transfer(appointment.doctor_id, appointment.patient_id, paid)
                .await
                .map_err(|e| {
                    error!("Refund for appointment {} failed, leaving it scheduled: {}", appointment_id, e);
                    AppointmentError::DependencyFailure(format!("Failed to refund credits: {}", e))
                })?;
        }

        match self
            .appointments
            .update_status(appointment_id, AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
            .await
        {
            Ok(cancelled) => {
                info!("Appointment {} cancelled by {}, {} credits refunded", appointment_id, actor_id, paid);
                Ok(cancelled)
            }
            Err(e) => {
                warn!("Cancelling appointment {} failed, taking the refund back: {}", appointment_id, e);
                if paid > 0 {
                    if let Err(reverse) = self
                        .ledger
                        .transfer(appointment.patient_id, appointment.doctor_id, paid)
                        .await
                    {
                        error!(
                            "Reversing refund of {} credits for appointment {} failed: {}",
                            paid, appointment_id, reverse
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// The doctor closes an appointment once it has started.
    pub async fn complete(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.participant_view(appointment_id, actor_id).await?;
        if appointment.doctor_id != actor_id {
            return Err(AppointmentError::Unauthorized);
        }
        ensure_transition(&appointment, AppointmentStatus::Completed)?;

        if now < appointment.start_time {
            return Err(AppointmentError::InvalidInput(
                "Cannot complete an appointment before its scheduled start".to_string(),
            ));
        }

        let completed = self
            .appointments
            .update_status(appointment_id, AppointmentStatus::Scheduled, AppointmentStatus::Completed)
            .await?;

        info!("Appointment {} completed", appointment_id);
        Ok(completed)
    }

    /// Sign a join token for a participant of a scheduled appointment.
    pub async fn video_token(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoJoinResponse, AppointmentError> {
        let appointment = self.participant_view(appointment_id, actor_id).await?;
        if !appointment.is_scheduled() {
            return Err(AppointmentError::InvalidStatusTransition(appointment.status));
        }

        let opens_at = appointment.start_time - self.join_window;
        if now < opens_at || now >= appointment.end_time {
            return Err(AppointmentError::JoinWindowClosed);
        }

        let session_id = appointment.video_session_id.clone().ok_or_else(|| {
            AppointmentError::DependencyFailure("Appointment has no video session".to_string())
        })?;

        let role = if appointment.doctor_id == actor_id {
            ParticipantRole::Doctor
        } else {
            ParticipantRole::Patient
        };
        let expires_at = appointment.end_time + Duration::minutes(JOIN_TOKEN_GRACE_MINUTES);

        let token = self
            .tokens
            .sign(&session_id, &actor_id.to_string(), role, expires_at)
            .map_err(|e| AppointmentError::DependencyFailure(format!("Failed to sign video token: {}", e)))?;

        self.appointments
            .set_video_token(appointment_id, &token.token)
            .await?;

        Ok(VideoJoinResponse {
            appointment_id,
            session_id,
            token: token.token,
            expires_at: token.expires_at,
        })
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        as_doctor: bool,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if as_doctor {
            self.appointments.list_for_doctor(user_id).await
        } else {
            self.appointments.list_for_patient(user_id).await
        }
    }

    async fn participant_view(
        &self,
        appointment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if !appointment.is_participant(actor_id) {
            return Err(AppointmentError::Unauthorized);
        }
        Ok(appointment)
    }

    /// Number of doctors with a booking lock currently held or awaited.
    pub async fn active_doctor_locks(&self) -> usize {
        self.doctor_locks.lock().await.len()
    }

    async fn doctor_lock(&self, doctor_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.doctor_locks.lock().await;
        Arc::clone(locks.entry(doctor_id).or_default())
    }

    // Drops the map entry once no other booking holds or waits on it.
    async fn release_doctor_lock(&self, doctor_id: Uuid) {
        let mut locks = self.doctor_locks.lock().await;
        if locks
            .get(&doctor_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&doctor_id);
        }
    }

    async fn refund(&self, doctor_id: Uuid, patient_id: Uuid, amount: i64, appointment_id: Uuid) {
        if amount <= 0 {
            return;
        }
        if let Err(e) = self.ledger.transfer(doctor_id, patient_id, amount).await {
            error!(
                "Refund of {} credits to patient {} for unbooked appointment {} failed: {}",
                amount, patient_id, appointment_id, e
            );
        }
    }
}

fn ensure_transition(appointment: &Appointment, next: AppointmentStatus) -> Result<(), AppointmentError> {
    if appointment.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppointmentError::InvalidStatusTransition(appointment.status))
    }
}
