// libs/appointment-cell/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use appointment_cell::services::{AvailabilityService, BookingService};
use appointment_cell::{
    Appointment, AppointmentStatus, BookAppointmentRequest, InMemoryAppointmentStore,
    InMemoryCreditLedger,
};
use doctor_cell::{
    AvailabilityStatus, AvailabilityWindow, Doctor, InMemoryDoctorStore, VerificationStatus,
};
use shared_config::SchedulingConfig;
use video_conferencing_cell::{DevVideoProvider, JoinTokenSigner, VideoSessionProvider};

pub const TOKEN_SECRET: &str = "test-video-secret";

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn doctor(id: Uuid, status: VerificationStatus) -> Doctor {
    Doctor {
        id,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: Some("ada@example.com".to_string()),
        specialty: Some("General Practice".to_string()),
        verification_status: status,
        created_at: None,
    }
}

pub fn window(doctor_id: Uuid, start: NaiveTime, end: NaiveTime, day_of_week: Option<u8>) -> AvailabilityWindow {
    AvailabilityWindow {
        id: Uuid::new_v4(),
        doctor_id,
        start_time: start,
        end_time: end,
        day_of_week,
        status: AvailabilityStatus::Available,
        created_at: None,
    }
}

pub fn appointment(
    doctor_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        doctor_id,
        patient_id: Uuid::new_v4(),
        start_time: start,
        end_time: end,
        status,
        description: None,
        price_credits: 2,
        video_session_id: Some("session".to_string()),
        video_session_token: None,
        created_at: start - chrono::Duration::days(7),
        updated_at: start - chrono::Duration::days(7),
    }
}

pub fn request(doctor_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: Some(doctor_id.to_string()),
        start_time: Some(start.to_rfc3339()),
        end_time: Some(end.to_rfc3339()),
        description: Some("Follow-up on blood pressure".to_string()),
    }
}

/// A verified doctor working 09:00-17:00 UTC every day and a patient holding
/// `patient_credits` credits.
pub struct Clinic {
    pub doctors: Arc<InMemoryDoctorStore>,
    pub appointments: Arc<InMemoryAppointmentStore>,
    pub ledger: Arc<InMemoryCreditLedger>,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub config: SchedulingConfig,
}

impl Clinic {
    pub async fn new(patient_credits: i64) -> Self {
        let doctors = Arc::new(InMemoryDoctorStore::new());
        let appointments = Arc::new(InMemoryAppointmentStore::new());
        let ledger = Arc::new(InMemoryCreditLedger::new());

        let doctor_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        doctors.insert_doctor(doctor(doctor_id, VerificationStatus::Verified)).await;
        doctors.insert_window(window(doctor_id, time(9, 0), time(17, 0), None)).await;
        ledger.insert_account(doctor_id, "doctor", 0).await;
        ledger.insert_account(patient_id, "patient", patient_credits).await;

        Self {
            doctors,
            appointments,
            ledger,
            doctor_id,
            patient_id,
            config: SchedulingConfig::default(),
        }
    }

    pub fn booking(&self) -> BookingService {
        self.booking_with(Arc::new(DevVideoProvider::new()))
    }

    pub fn booking_with(&self, video: Arc<dyn VideoSessionProvider>) -> BookingService {
        BookingService::new(
            self.doctors.clone(),
            self.appointments.clone(),
            self.ledger.clone(),
            video,
            JoinTokenSigner::new(TOKEN_SECRET),
            &self.config,
        )
    }

    pub fn availability(&self) -> AvailabilityService {
        AvailabilityService::new(self.doctors.clone(), self.appointments.clone(), &self.config)
    }

    pub async fn add_patient(&self, credits: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.ledger.insert_account(id, "patient", credits).await;
        id
    }
}
