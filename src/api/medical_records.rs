//! Medical record (prontuário) endpoints. Records are created and read, never
//! updated: `data_registro` is assigned by the server at insert time.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{actions, CreateProntuarioRequest, Prontuario, Usuario};
use crate::AppState;

use super::audit;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_required;

/// Create a medical record entry
///
/// POST /prontuarios
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    user: Usuario,
    Json(req): Json<CreateProntuarioRequest>,
) -> Result<(StatusCode, Json<Prontuario>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&req.descricao, "Descrição") {
        errors.add("descricao", e);
    }
    if let Err(e) = validate_required(&req.tipo_registro, "Tipo de registro") {
        errors.add("tipo_registro", e);
    }
    errors.finish()?;

    let paciente: Option<(i64,)> = sqlx::query_as("SELECT id FROM pacientes WHERE id = ?")
        .bind(req.paciente_id)
        .fetch_optional(&state.db)
        .await?;
    if paciente.is_none() {
        return Err(ApiError::bad_request("Paciente não encontrado."));
    }

    let profissional: Option<(i64,)> = sqlx::query_as("SELECT id FROM profissionais WHERE id = ?")
        .bind(req.profissional_id)
        .fetch_optional(&state.db)
        .await?;
    if profissional.is_none() {
        return Err(ApiError::bad_request("Profissional não encontrado."));
    }

    if let Some(consulta_id) = req.consulta_id {
        let consulta: Option<(i64,)> = sqlx::query_as("SELECT id FROM consultas WHERE id = ?")
            .bind(consulta_id)
            .fetch_optional(&state.db)
            .await?;
        if consulta.is_none() {
            return Err(ApiError::bad_request("Consulta não encontrada."));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO prontuarios (paciente_id, profissional_id, consulta_id, data_registro, descricao, tipo_registro) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(req.paciente_id)
    .bind(req.profissional_id)
    .bind(req.consulta_id)
    .bind(&now)
    .bind(&req.descricao)
    .bind(&req.tipo_registro)
    .execute(&state.db)
    .await?;

    let prontuario: Prontuario = sqlx::query_as("SELECT * FROM prontuarios WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    audit::record(
        &state,
        actions::CRIAR_PRONTUARIO,
        Some(user.id),
        Some(format!(
            "Prontuário ID={} criado pelo usuário ID={}",
            prontuario.id, user.id
        )),
    )
    .await;

    Ok((StatusCode::CREATED, Json(prontuario)))
}

/// Get a medical record by id
///
/// GET /prontuarios/:id
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Prontuario>, ApiError> {
    let prontuario = sqlx::query_as::<_, Prontuario>("SELECT * FROM prontuarios WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Prontuário não encontrado."))?;

    Ok(Json(prontuario))
}

/// List the records of one patient, newest first
///
/// GET /prontuarios/paciente/:id
pub async fn list_by_patient(
    State(state): State<Arc<AppState>>,
    Path(paciente_id): Path<i64>,
) -> Result<Json<Vec<Prontuario>>, ApiError> {
    let paciente: Option<(i64,)> = sqlx::query_as("SELECT id FROM pacientes WHERE id = ?")
        .bind(paciente_id)
        .fetch_optional(&state.db)
        .await?;
    if paciente.is_none() {
        return Err(ApiError::not_found("Paciente não encontrado."));
    }

    let prontuarios = sqlx::query_as::<_, Prontuario>(
        "SELECT * FROM prontuarios WHERE paciente_id = ? ORDER BY data_registro DESC",
    )
    .bind(paciente_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(prontuarios))
}
