// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::DoctorStore;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use video_conferencing_cell::{JoinTokenSigner, VideoSessionProvider};

use crate::models::{AppointmentError, BookAppointmentRequest, DoctorSlotsResponse};
use crate::services::{AvailabilityService, BookingService};
use crate::store::{AppointmentStore, CreditLedger};

/// Shared state for the appointment routes.
#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub availability: Arc<AvailabilityService>,
    pub booking: Arc<BookingService>,
}

impl AppointmentState {
    pub fn new(
        config: Arc<AppConfig>,
        doctors: Arc<dyn DoctorStore>,
        appointments: Arc<dyn AppointmentStore>,
        ledger: Arc<dyn CreditLedger>,
        video: Arc<dyn VideoSessionProvider>,
    ) -> Self {
        let availability = AvailabilityService::new(
            Arc::clone(&doctors),
            Arc::clone(&appointments),
            &config.scheduling,
        );
        let booking = BookingService::new(
            doctors,
            appointments,
            ledger,
            video,
            JoinTokenSigner::new(&config.video_token_secret),
            &config.scheduling,
        );

        Self {
            availability: Arc::new(availability),
            booking: Arc::new(booking),
            config,
        }
    }
}

pub fn map_appointment_error(e: AppointmentError) -> AppError {
    let message = e.to_string();
    match e {
        AppointmentError::NotFound
        | AppointmentError::DoctorNotFound
        | AppointmentError::PatientNotFound => AppError::NotFound(message),
        AppointmentError::InvalidInput(_)
        | AppointmentError::InvalidStatusTransition(_)
        | AppointmentError::JoinWindowClosed => AppError::BadRequest(message),
        AppointmentError::InsufficientCredit { .. } => AppError::PaymentRequired(message),
        AppointmentError::SlotConflict => AppError::Conflict(message),
        AppointmentError::Unauthorized => AppError::Forbidden(message),
        AppointmentError::DependencyFailure(_) => AppError::ExternalService(message),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

/// Bookable slots for a doctor over the next few days.
pub async fn get_available_slots(
    State(state): State<AppointmentState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<(StatusCode, Json<DoctorSlotsResponse>), AppError> {
    let response = state
        .availability
        .available_slots(doctor_id, Utc::now())
        .await
        .map_err(map_appointment_error)?;

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(response)))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.is_doctor() {
        return Err(AppError::Forbidden("Only patients can book appointments".to_string()));
    }
    let patient_id = caller_id(&user)?;

    let appointment = state
        .booking
        .book(patient_id, &request, Utc::now())
        .await
        .map_err(map_appointment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully",
        })),
    ))
}

pub async fn get_my_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&user)?;

    let appointments = state
        .booking
        .list_for_user(user_id, user.is_doctor())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments,
    })))
}

pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&user)?;

    let appointment = state
        .booking
        .cancel(appointment_id, user_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled",
    })))
}

pub async fn complete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Only doctors can complete appointments".to_string()));
    }
    let doctor_id = caller_id(&user)?;

    let appointment = state
        .booking
        .complete(appointment_id, doctor_id, Utc::now())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment marked as completed",
    })))
}

pub async fn create_video_token(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&user)?;

    let join = state
        .booking
        .video_token(appointment_id, user_id, Utc::now())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "videoSessionId": join.session_id,
        "token": join.token,
        "expiresAt": join.expires_at,
    })))
}
