// libs/appointment-cell/src/lib.rs
//! # Appointment Cell
//!
//! Slot generation, booking and the appointment lifecycle.
//!
//! - [`services::conflict`] decides whether two half-open intervals overlap.
//! - [`services::SlotGenerator`] expands a doctor's recurring windows into
//!   bookable slots for today and the following days.
//! - [`services::BookingService`] re-checks the chosen slot under a per-doctor
//!   lock, opens the video session, moves the credits and writes the row last.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use handlers::AppointmentState;
pub use models::{
    Account, Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, DaySlots,
    DoctorSlotsResponse, Interval, NewAppointment, Slot,
};
pub use router::appointment_routes;
pub use store::{
    AppointmentStore, CreditLedger, InMemoryAppointmentStore, InMemoryCreditLedger,
    SupabaseAppointmentStore, SupabaseCreditLedger,
};
