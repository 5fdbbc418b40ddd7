// libs/appointment-cell/src/services/mod.rs

pub mod availability;
pub mod booking;
pub mod conflict;
pub mod slots;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use conflict::{find_conflicts, has_conflict, overlaps};
pub use slots::SlotGenerator;
