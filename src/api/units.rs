//! Care unit (unidade) CRUD endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateUnidadeRequest, Unidade, UpdateUnidadeRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_required, validate_unit_kind};

fn validate_create_request(req: &CreateUnidadeRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required(&req.nome, "Nome") {
        errors.add("nome", e);
    }
    if let Err(e) = validate_unit_kind(&req.tipo_unidade) {
        errors.add("tipo_unidade", e);
    }
    if let Err(e) = validate_required(&req.endereco, "Endereço") {
        errors.add("endereco", e);
    }
    if let Err(e) = validate_required(&req.telefone, "Telefone") {
        errors.add("telefone", e);
    }

    errors.finish()
}

/// Create a care unit
///
/// POST /unidades
pub async fn create_unit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUnidadeRequest>,
) -> Result<(StatusCode, Json<Unidade>), ApiError> {
    validate_create_request(&req)?;

    let result = sqlx::query(
        "INSERT INTO unidades (nome, tipo_unidade, endereco, telefone) VALUES (?, ?, ?, ?)",
    )
    .bind(&req.nome)
    .bind(&req.tipo_unidade)
    .bind(&req.endereco)
    .bind(&req.telefone)
    .execute(&state.db)
    .await?;

    let unidade: Unidade = sqlx::query_as("SELECT * FROM unidades WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    tracing::info!(unidade_id = unidade.id, nome = %unidade.nome, "Unit created");

    Ok((StatusCode::CREATED, Json(unidade)))
}

/// List all care units
///
/// GET /unidades
pub async fn list_units(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Unidade>>, ApiError> {
    let unidades = sqlx::query_as::<_, Unidade>("SELECT * FROM unidades ORDER BY id")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(unidades))
}

/// Get a care unit by id
///
/// GET /unidades/:id
pub async fn get_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Unidade>, ApiError> {
    let unidade = sqlx::query_as::<_, Unidade>("SELECT * FROM unidades WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Unidade não encontrada."))?;

    Ok(Json(unidade))
}

/// Update a care unit. Only provided fields are changed.
///
/// PUT /unidades/:id
pub async fn update_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUnidadeRequest>,
) -> Result<Json<Unidade>, ApiError> {
    if let Some(tipo_unidade) = &req.tipo_unidade {
        validate_unit_kind(tipo_unidade)
            .map_err(|e| ApiError::validation_field("tipo_unidade", e))?;
    }

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM unidades WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Unidade não encontrada."));
    }

    sqlx::query(
        "UPDATE unidades SET \
            nome = COALESCE(?, nome), \
            tipo_unidade = COALESCE(?, tipo_unidade), \
            endereco = COALESCE(?, endereco), \
            telefone = COALESCE(?, telefone) \
         WHERE id = ?",
    )
    .bind(&req.nome)
    .bind(&req.tipo_unidade)
    .bind(&req.endereco)
    .bind(&req.telefone)
    .bind(id)
    .execute(&state.db)
    .await?;

    let unidade: Unidade = sqlx::query_as("SELECT * FROM unidades WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(unidade))
}

/// Delete a care unit. Restricted while professionals are assigned to it.
///
/// DELETE /unidades/:id
pub async fn delete_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM unidades WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Unidade não encontrada."));
    }

    // Friendly message; the RESTRICT constraint is the actual guard
    let assigned: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM profissionais WHERE unidade_id = ?")
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    if assigned.0 > 0 {
        return Err(ApiError::conflict("Unidade possui profissionais vinculados."));
    }

    sqlx::query("DELETE FROM unidades WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!(unidade_id = id, "Unit deleted");

    Ok(StatusCode::NO_CONTENT)
}
