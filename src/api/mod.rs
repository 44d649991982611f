pub mod audit;
pub mod auth;
mod consultations;
mod error;
mod medical_records;
mod patients;
mod professionals;
mod units;
mod validation;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Registration-style resources (public, as in the original API)
    let public_routes = Router::new()
        .route("/pacientes", post(patients::create_patient))
        .route("/pacientes", get(patients::list_patients))
        .route("/pacientes/:id", get(patients::get_patient))
        .route("/pacientes/:id", put(patients::update_patient))
        .route("/pacientes/:id", delete(patients::delete_patient))
        .route("/profissionais", post(professionals::create_professional))
        .route("/profissionais", get(professionals::list_professionals))
        .route("/profissionais/:id", get(professionals::get_professional))
        .route("/profissionais/:id", put(professionals::update_professional))
        .route("/profissionais/:id", delete(professionals::delete_professional))
        .route("/unidades", post(units::create_unit))
        .route("/unidades", get(units::list_units))
        .route("/unidades/:id", get(units::get_unit))
        .route("/unidades/:id", put(units::update_unit))
        .route("/unidades/:id", delete(units::delete_unit));

    // Clinical resources require a bearer token
    let protected_routes = Router::new()
        .route("/consultas", post(consultations::create_consultation))
        .route("/consultas", get(consultations::list_consultations))
        .route("/consultas/:id", get(consultations::get_consultation))
        .route("/consultas/:id", put(consultations::update_consultation))
        .route("/consultas/:id/status", patch(consultations::update_status))
        .route("/consultas/pacientes/:id", get(consultations::list_by_patient))
        .route(
            "/consultas/profissionais/:id",
            get(consultations::list_by_professional),
        )
        .route("/prontuarios", post(medical_records::create_record))
        .route("/prontuarios/:id", get(medical_records::get_record))
        .route(
            "/prontuarios/paciente/:id",
            get(medical_records::list_by_patient),
        )
        .route("/logs", get(audit::list_logs))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
