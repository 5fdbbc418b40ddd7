// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use doctor_cell::{DoctorError, DoctorSummary};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub description: Option<String>,
    /// Credits charged at booking; a cancellation refunds exactly this.
    pub price_credits: i64,
    pub video_session_id: Option<String>,
    pub video_session_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Stored rows always satisfy `start_time < end_time`.
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "SCHEDULED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl AppointmentStatus {
    /// Only scheduled appointments move, and only to a terminal state.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
                | (AppointmentStatus::Scheduled, AppointmentStatus::Completed)
        )
    }
}

/// A row ready to be written by the booking workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: Option<String>,
    pub price_credits: i64,
    pub video_session_id: Option<String>,
}

impl NewAppointment {
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Half-open `[start, end)` span of time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppointmentError> {
        if start >= end {
            return Err(AppointmentError::InvalidInput(
                "Start time must be before end time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// e.g. `9:00 AM - 9:30 AM` in clinic time.
    pub formatted: String,
    pub day: String,
}

impl Slot {
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySlots {
    /// `YYYY-MM-DD` in clinic time.
    pub date: String,
    pub display_date: String,
    pub slots: Vec<Slot>,
    pub available_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSlotsResponse {
    pub success: bool,
    pub days: Vec<DaySlots>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<DoctorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DoctorSlotsResponse {
    pub fn available(doctor: DoctorSummary, days: Vec<DaySlots>) -> Self {
        Self {
            success: true,
            days,
            doctor: Some(doctor),
            message: None,
            error: None,
        }
    }

    pub fn no_schedule(doctor: DoctorSummary) -> Self {
        Self {
            success: true,
            days: Vec::new(),
            doctor: Some(doctor),
            message: Some("This doctor has not set any availability yet".to_string()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            days: Vec::new(),
            doctor: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// Booking form as submitted by a patient. Every field is optional on the
/// wire so missing values surface as validation errors, not 422s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    #[serde(alias = "doctor_id")]
    pub doctor_id: Option<String>,
    #[serde(alias = "start_time")]
    pub start_time: Option<String>,
    #[serde(alias = "end_time")]
    pub end_time: Option<String>,
    pub description: Option<String>,
}

/// A booking request that passed boundary validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    pub doctor_id: Uuid,
    pub interval: Interval,
    pub description: Option<String>,
}

impl BookAppointmentRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<ValidatedBooking, AppointmentError> {
        let doctor_id = required(&self.doctor_id, "doctorId")?;
        let start = required(&self.start_time, "startTime")?;
        let end = required(&self.end_time, "endTime")?;

        let doctor_id = Uuid::parse_str(doctor_id)
            .map_err(|_| AppointmentError::InvalidInput("doctorId is not a valid id".to_string()))?;
        let start = parse_timestamp(start, "startTime")?;
        let end = parse_timestamp(end, "endTime")?;

        let interval = Interval::new(start, end)?;
        if interval.start < now {
            return Err(AppointmentError::InvalidInput(
                "Cannot book an appointment in the past".to_string(),
            ));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(ValidatedBooking {
            doctor_id,
            interval,
            description,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppointmentError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppointmentError::InvalidInput(format!("{} is required", field)))
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppointmentError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppointmentError::InvalidInput(format!("{} is not a valid ISO timestamp", field)))
}

/// A user's prepaid credit balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub role: Option<String>,
    pub credits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJoinResponse {
    pub appointment_id: Uuid,
    pub session_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found or not verified")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredit { required: i64, available: i64 },

    #[error("This time slot is already booked. Please choose another time")]
    SlotConflict,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("The video room for this appointment is not open right now")]
    JoinWindowClosed,

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("{0}")]
    DependencyFailure(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound | DoctorError::NotVerified => AppointmentError::DoctorNotFound,
            other => AppointmentError::Database(other.to_string()),
        }
    }
}
