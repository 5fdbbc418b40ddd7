use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AvailabilityWindow, Doctor, DoctorError, NewAvailabilityWindow};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryDoctorStore;
pub use supabase::SupabaseDoctorStore;

/// Persistence seam for doctors and their schedules.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError>;

    /// Windows for one doctor, oldest first.
    async fn get_availability_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError>;

    async fn replace_availability_windows(
        &self,
        doctor_id: Uuid,
        windows: Vec<NewAvailabilityWindow>,
    ) -> Result<Vec<AvailabilityWindow>, DoctorError>;
}
