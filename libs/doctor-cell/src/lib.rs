pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use handlers::DoctorCellState;
pub use models::{
    window_for_date, AvailabilityStatus, AvailabilityWindow, Doctor, DoctorError,
    DoctorSummary, VerificationStatus,
};
pub use store::{DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
