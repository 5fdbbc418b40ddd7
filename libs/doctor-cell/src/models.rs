// libs/doctor-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub verification_status: VerificationStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            id: self.id,
            name: self.full_name(),
            specialty: self.specialty.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

/// Public slice of a doctor returned next to generated slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

/// A doctor's recurring daily booking window.
///
/// Only the time of day matters, as clinic wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    /// 0 = Sunday .. 6 = Saturday; `None` applies to every day.
    #[serde(default)]
    pub day_of_week: Option<u8>,
    pub status: AvailabilityStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    pub fn is_available(&self) -> bool {
        self.status == AvailabilityStatus::Available && self.start_time < self.end_time
    }

    pub fn applies_to(&self, date: NaiveDate) -> bool {
        match self.day_of_week {
            Some(day) => u32::from(day) == date.weekday().num_days_from_sunday(),
            None => true,
        }
    }
}

/// Raw `availabilities` row.
///
/// Rows written by older clients hold full timestamps in the time columns;
/// those are converted to clinic time and their date part is dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub day_of_week: Option<u8>,
    pub status: AvailabilityStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl AvailabilityRow {
    pub fn into_window(self, timezone: Tz) -> Result<AvailabilityWindow, DoctorError> {
        let read = |raw: &str| {
            time_of_day::parse_in(raw, timezone)
                .ok_or_else(|| DoctorError::Database(format!("Unreadable window time '{}'", raw)))
        };

        Ok(AvailabilityWindow {
            id: self.id,
            doctor_id: self.doctor_id,
            start_time: read(&self.start_time)?,
            end_time: read(&self.end_time)?,
            day_of_week: self.day_of_week,
            status: self.status,
            created_at: self.created_at,
        })
    }
}

/// Pick the window that governs `date`.
///
/// A weekday-specific window wins over an untagged one; within each group
/// the first entry (store order, oldest first) is used.
pub fn window_for_date(windows: &[AvailabilityWindow], date: NaiveDate) -> Option<&AvailabilityWindow> {
    let usable = || windows.iter().filter(|w| w.is_available());

    usable()
        .find(|w| w.day_of_week.is_some() && w.applies_to(date))
        .or_else(|| usable().find(|w| w.day_of_week.is_none()))
}

/// Window as submitted by a doctor before it is given an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAvailabilityWindow {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub day_of_week: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindowInput {
    /// `HH:MM`, `HH:MM:SS` or an RFC 3339 timestamp.
    pub start_time: String,
    pub end_time: String,
    pub day_of_week: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub windows: Vec<AvailabilityWindowInput>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor is not verified")]
    NotVerified,

    #[error("Invalid availability window: {0}")]
    InvalidWindow(String),

    #[error("Unauthorized access to doctor data")]
    UnauthorizedAccess,

    #[error("Database error: {0}")]
    Database(String),
}

// Reads "09:00" or "09:00:00", always writes "HH:MM:SS".
pub(crate) mod time_of_day {
    use chrono::{DateTime, NaiveTime};
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day '{}'", raw)))
    }

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }

    /// Like `parse`, but also takes an RFC 3339 timestamp and keeps its
    /// wall-clock time in `timezone`.
    pub fn parse_in(raw: &str, timezone: Tz) -> Option<NaiveTime> {
        parse(raw).or_else(|| {
            DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|dt| dt.with_timezone(&timezone).time())
        })
    }
}
