use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono_tz::Tz;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{DoctorError, SetAvailabilityRequest};
use crate::services::{AvailabilityService, DoctorService};
use crate::store::DoctorStore;

/// Shared state for the doctor routes.
#[derive(Clone)]
pub struct DoctorCellState {
    pub config: Arc<AppConfig>,
    pub doctors: Arc<DoctorService>,
    pub availability: Arc<AvailabilityService>,
}

impl DoctorCellState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn DoctorStore>) -> Self {
        let timezone: Tz = config.scheduling.timezone;
        Self {
            doctors: Arc::new(DoctorService::new(Arc::clone(&store))),
            availability: Arc::new(AvailabilityService::new(store, timezone)),
            config,
        }
    }
}

pub fn map_doctor_error(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::NotVerified => AppError::NotFound("Doctor not found or not verified".to_string()),
        DoctorError::InvalidWindow(msg) => AppError::BadRequest(msg),
        DoctorError::UnauthorizedAccess => AppError::Forbidden(e.to_string()),
        DoctorError::Database(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_doctor_availability(
    State(state): State<DoctorCellState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.doctors.get_doctor(doctor_id).await.map_err(map_doctor_error)?;
    let windows = state.availability.get_windows(doctor_id).await.map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor.summary(),
        "windows": windows,
        "timezone": state.config.scheduling.timezone.name(),
    })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

/// A doctor replaces their own recurring schedule.
pub async fn set_my_availability(
    State(state): State<DoctorCellState>,
    Extension(user): Extension<User>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Forbidden("Only doctors can manage availability".to_string()));
    }

    let doctor_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))?;

    let windows = state
        .availability
        .set_windows(doctor_id, request)
        .await
        .map_err(map_doctor_error)?;

    Ok(Json(json!({
        "success": true,
        "windows": windows,
        "message": "Availability updated",
    })))
}
