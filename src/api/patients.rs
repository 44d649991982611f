//! Patient (paciente) endpoints.
//!
//! Creating a patient is a composite write: the backing Usuario and the
//! Paciente profile are inserted in one transaction so a failure on either
//! side leaves no orphan row behind.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreatePacienteRequest, Paciente, PacienteRead, UpdatePacienteRequest, UserRole};
use crate::AppState;

use super::auth::hash_password;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    normalize_cpf, validate_cpf, validate_email, validate_required, validate_senha,
};

const READ_QUERY: &str = "SELECT p.id, p.usuario_id, u.nome_completo, u.email, p.cpf, \
                          p.data_nascimento, p.telefone, p.endereco, p.plano_saude, p.numero_carteirinha \
                          FROM pacientes p INNER JOIN usuarios u ON p.usuario_id = u.id";

fn validate_create_request(req: &CreatePacienteRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required(&req.nome_completo, "Nome completo") {
        errors.add("nome_completo", e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_senha(&req.senha) {
        errors.add("senha", e);
    }
    if let Err(e) = validate_cpf(&req.cpf) {
        errors.add("cpf", e);
    }
    if let Err(e) = validate_required(&req.telefone, "Telefone") {
        errors.add("telefone", e);
    }
    if let Err(e) = validate_required(&req.endereco, "Endereço") {
        errors.add("endereco", e);
    }

    errors.finish()
}

/// Create a patient together with its backing user account
///
/// POST /pacientes
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePacienteRequest>,
) -> Result<(StatusCode, Json<PacienteRead>), ApiError> {
    validate_create_request(&req)?;

    let cpf = normalize_cpf(&req.cpf);

    // Pre-checks give a friendly message; the UNIQUE indexes remain the
    // real guard against racing duplicates.
    let existing_email: Option<(i64,)> = sqlx::query_as("SELECT id FROM usuarios WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing_email.is_some() {
        return Err(ApiError::conflict("E-mail já cadastrado."));
    }

    let existing_cpf: Option<(i64,)> = sqlx::query_as("SELECT id FROM pacientes WHERE cpf = ?")
        .bind(&cpf)
        .fetch_optional(&state.db)
        .await?;
    if existing_cpf.is_some() {
        return Err(ApiError::conflict("CPF já cadastrado."));
    }

    let senha_hash = hash_password(&req.senha)
        .map_err(|_| ApiError::internal("Falha ao gerar hash de senha."))?;
    let now = chrono::Utc::now().to_rfc3339();

    // User and profile go in as one unit of work
    let mut tx = state.db.begin().await?;

    let user_result = sqlx::query(
        "INSERT INTO usuarios (nome_completo, email, senha_hash, tipo, criado_em, atualizado_em) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.nome_completo)
    .bind(&req.email)
    .bind(&senha_hash)
    .bind(UserRole::Paciente.to_string())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("E-mail já cadastrado.")
        }
        _ => ApiError::from(e),
    })?;
    let usuario_id = user_result.last_insert_rowid();

    let patient_result = sqlx::query(
        "INSERT INTO pacientes (usuario_id, cpf, data_nascimento, telefone, endereco, plano_saude, numero_carteirinha) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(usuario_id)
    .bind(&cpf)
    .bind(req.data_nascimento.to_string())
    .bind(&req.telefone)
    .bind(&req.endereco)
    .bind(&req.plano_saude)
    .bind(&req.numero_carteirinha)
    .execute(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("CPF já cadastrado.")
        }
        _ => ApiError::from(e),
    })?;
    let paciente_id = patient_result.last_insert_rowid();

    tx.commit().await?;

    let paciente: PacienteRead =
        sqlx::query_as(&format!("{READ_QUERY} WHERE p.id = ?"))
            .bind(paciente_id)
            .fetch_one(&state.db)
            .await?;

    tracing::info!(paciente_id, usuario_id, "Patient created");

    Ok((StatusCode::CREATED, Json(paciente)))
}

/// List all patients
///
/// GET /pacientes
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PacienteRead>>, ApiError> {
    let pacientes = sqlx::query_as::<_, PacienteRead>(&format!("{READ_QUERY} ORDER BY p.id"))
        .fetch_all(&state.db)
        .await?;

    Ok(Json(pacientes))
}

/// Get a patient by id
///
/// GET /pacientes/:id
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PacienteRead>, ApiError> {
    let paciente = sqlx::query_as::<_, PacienteRead>(&format!("{READ_QUERY} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Paciente não encontrado."))?;

    Ok(Json(paciente))
}

/// Update a patient. Only provided fields are changed.
///
/// PUT /pacientes/:id
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePacienteRequest>,
) -> Result<Json<PacienteRead>, ApiError> {
    let existing: Option<Paciente> = sqlx::query_as("SELECT * FROM pacientes WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Paciente não encontrado."));
    }

    sqlx::query(
        "UPDATE pacientes SET \
            telefone = COALESCE(?, telefone), \
            endereco = COALESCE(?, endereco), \
            plano_saude = COALESCE(?, plano_saude), \
            numero_carteirinha = COALESCE(?, numero_carteirinha) \
         WHERE id = ?",
    )
    .bind(&req.telefone)
    .bind(&req.endereco)
    .bind(&req.plano_saude)
    .bind(&req.numero_carteirinha)
    .bind(id)
    .execute(&state.db)
    .await?;

    let paciente: PacienteRead = sqlx::query_as(&format!("{READ_QUERY} WHERE p.id = ?"))
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(paciente))
}

/// Delete a patient profile. The backing user account is kept.
///
/// DELETE /pacientes/:id
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM pacientes WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Paciente não encontrado."));
    }

    tracing::info!(paciente_id = id, "Patient deleted");

    Ok(StatusCode::NO_CONTENT)
}
