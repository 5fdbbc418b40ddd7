use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tracing::info;

use appointment_cell::{
    appointment_routes, AppointmentState, AppointmentStore, CreditLedger,
    InMemoryAppointmentStore, InMemoryCreditLedger, SupabaseAppointmentStore,
    SupabaseCreditLedger,
};
use doctor_cell::router::doctor_routes;
use doctor_cell::{DoctorCellState, DoctorStore, InMemoryDoctorStore, SupabaseDoctorStore};
use shared_config::{AppConfig, StorageBackend};
use shared_database::supabase::SupabaseClient;
use video_conferencing_cell::provider_from_config;

struct Stores {
    doctors: Arc<dyn DoctorStore>,
    appointments: Arc<dyn AppointmentStore>,
    ledger: Arc<dyn CreditLedger>,
}

fn build_stores(config: &AppConfig) -> Stores {
    match config.storage_backend {
        StorageBackend::Supabase => {
            let supabase = Arc::new(SupabaseClient::new(config));
            Stores {
                doctors: Arc::new(SupabaseDoctorStore::new(
                    Arc::clone(&supabase),
                    config.scheduling.timezone,
                )),
                appointments: Arc::new(SupabaseAppointmentStore::new(Arc::clone(&supabase))),
                ledger: Arc::new(SupabaseCreditLedger::new(supabase)),
            }
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            Stores {
                doctors: Arc::new(InMemoryDoctorStore::new()),
                appointments: Arc::new(InMemoryAppointmentStore::new()),
                ledger: Arc::new(InMemoryCreditLedger::new()),
            }
        }
    }
}

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let stores = build_stores(&config);
    let video = provider_from_config(&config);
    info!("Video sessions provided by '{}'", video.name());

    let doctor_state = DoctorCellState::new(config.clone(), Arc::clone(&stores.doctors));
    let appointment_state = AppointmentState::new(
        config,
        stores.doctors,
        stores.appointments,
        stores.ledger,
        video,
    );

    Router::new()
        .route("/", get(|| async { "Telehealth scheduler API is running!" }))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
}
