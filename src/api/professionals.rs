//! Healthcare professional (profissional) endpoints.
//!
//! Same composite-create discipline as patients: Usuario and Profissional are
//! inserted in one transaction. A professional always belongs to a care unit.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    CreateProfissionalRequest, Profissional, ProfissionalRead, UpdateProfissionalRequest, UserRole,
};
use crate::AppState;

use super::auth::hash_password;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    normalize_cpf, validate_cpf, validate_email, validate_required, validate_senha,
};

const READ_QUERY: &str = "SELECT p.id, p.usuario_id, u.nome_completo, u.email, p.cpf, \
                          p.registro_conselho, p.tipo_conselho, p.especialidade, p.unidade_id \
                          FROM profissionais p INNER JOIN usuarios u ON p.usuario_id = u.id";

fn validate_create_request(req: &CreateProfissionalRequest) -> Result<(), ApiError> {
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
    if let Err(e) = validate_required(&req.registro_conselho, "Registro de conselho") {
        errors.add("registro_conselho", e);
    }
    if let Err(e) = validate_required(&req.tipo_conselho, "Tipo de conselho") {
        errors.add("tipo_conselho", e);
    }
    if let Err(e) = validate_required(&req.especialidade, "Especialidade") {
        errors.add("especialidade", e);
    }

    errors.finish()
}

async fn unit_exists(db: &crate::DbPool, unidade_id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM unidades WHERE id = ?")
        .bind(unidade_id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

/// Create a professional together with its backing user account
///
/// POST /profissionais
pub async fn create_professional(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProfissionalRequest>,
) -> Result<(StatusCode, Json<ProfissionalRead>), ApiError> {
    validate_create_request(&req)?;

    let cpf = normalize_cpf(&req.cpf);

    let existing_email: Option<(i64,)> = sqlx::query_as("SELECT id FROM usuarios WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if existing_email.is_some() {
        return Err(ApiError::conflict("E-mail já cadastrado."));
    }

    let existing_cpf: Option<(i64,)> = sqlx::query_as("SELECT id FROM profissionais WHERE cpf = ?")
        .bind(&cpf)
        .fetch_optional(&state.db)
        .await?;
    if existing_cpf.is_some() {
        return Err(ApiError::conflict("CPF já cadastrado."));
    }

    if !unit_exists(&state.db, req.unidade_id).await? {
        return Err(ApiError::bad_request("Unidade não encontrada."));
    }

    let senha_hash = hash_password(&req.senha)
        .map_err(|_| ApiError::internal("Falha ao gerar hash de senha."))?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;

    let user_result = sqlx::query(
        "INSERT INTO usuarios (nome_completo, email, senha_hash, tipo, criado_em, atualizado_em) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&req.nome_completo)
    .bind(&req.email)
    .bind(&senha_hash)
    .bind(UserRole::Profissional.to_string())
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

    let prof_result = sqlx::query(
        "INSERT INTO profissionais (usuario_id, cpf, registro_conselho, tipo_conselho, especialidade, unidade_id) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(usuario_id)
    .bind(&cpf)
    .bind(&req.registro_conselho)
    .bind(&req.tipo_conselho)
    .bind(&req.especialidade)
    .bind(req.unidade_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("CPF já cadastrado.")
        }
        _ => ApiError::from(e),
    })?;
    let profissional_id = prof_result.last_insert_rowid();

    tx.commit().await?;

    let profissional: ProfissionalRead = sqlx::query_as(&format!("{READ_QUERY} WHERE p.id = ?"))
        .bind(profissional_id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(profissional_id, usuario_id, "Professional created");

    Ok((StatusCode::CREATED, Json(profissional)))
}

/// List all professionals
///
/// GET /profissionais
pub async fn list_professionals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProfissionalRead>>, ApiError> {
    let profissionais =
        sqlx::query_as::<_, ProfissionalRead>(&format!("{READ_QUERY} ORDER BY p.id"))
            .fetch_all(&state.db)
            .await?;

    Ok(Json(profissionais))
}

/// Get a professional by id
///
/// GET /profissionais/:id
pub async fn get_professional(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ProfissionalRead>, ApiError> {
    let profissional = sqlx::query_as::<_, ProfissionalRead>(&format!("{READ_QUERY} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Profissional não encontrado."))?;

    Ok(Json(profissional))
}

/// Update a professional. Only provided fields are changed; a changed
/// unidade_id must reference an existing unit.
///
/// PUT /profissionais/:id
pub async fn update_professional(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProfissionalRequest>,
) -> Result<Json<ProfissionalRead>, ApiError> {
    let existing: Option<Profissional> = sqlx::query_as("SELECT * FROM profissionais WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Profissional não encontrado."));
    }

    if let Some(unidade_id) = req.unidade_id {
        if !unit_exists(&state.db, unidade_id).await? {
            return Err(ApiError::bad_request("Unidade não encontrada."));
        }
    }

    sqlx::query(
        "UPDATE profissionais SET \
            registro_conselho = COALESCE(?, registro_conselho), \
            tipo_conselho = COALESCE(?, tipo_conselho), \
            especialidade = COALESCE(?, especialidade), \
            unidade_id = COALESCE(?, unidade_id) \
         WHERE id = ?",
    )
    .bind(&req.registro_conselho)
    .bind(&req.tipo_conselho)
    .bind(&req.especialidade)
    .bind(req.unidade_id)
    .bind(id)
    .execute(&state.db)
    .await?;

    let profissional: ProfissionalRead = sqlx::query_as(&format!("{READ_QUERY} WHERE p.id = ?"))
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(profissional))
}

/// Delete a professional profile. The backing user account is kept.
///
/// DELETE /profissionais/:id
pub async fn delete_professional(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM profissionais WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Profissional não encontrado."));
    }

    tracing::info!(profissional_id = id, "Professional deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_requires_existing_unit() {
        let app = testing::app(testing::test_state().await);

        let (status, body) = testing::request(
            &app,
            "POST",
            "/profissionais",
            None,
            Some(json!({
                "nome_completo": "Dr. João Souza",
                "email": "joao@x.com",
                "senha": "senha123",
                "cpf": "52998224725",
                "registro_conselho": "123456",
                "tipo_conselho": "CRM",
                "especialidade": "Cardiologia",
                "unidade_id": 99
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Unidade não encontrada.");
    }

    #[tokio::test]
    async fn test_create_and_get_professional() {
        let app = testing::app(testing::test_state().await);
        let unidade_id = testing::seed_unidade(&app).await;

        let (status, body) = testing::request(
            &app,
            "POST",
            "/profissionais",
            None,
            Some(json!({
                "nome_completo": "Dr. João Souza",
                "email": "joao@x.com",
                "senha": "senha123",
                "cpf": "529.982.247-25",
                "registro_conselho": "123456",
                "tipo_conselho": "CRM",
                "especialidade": "Cardiologia",
                "unidade_id": unidade_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();
        // CPF stored in normalized digit form
        assert_eq!(body["cpf"], "52998224725");

        let (status, body) =
            testing::request(&app, "GET", &format!("/profissionais/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["especialidade"], "Cardiologia");
        assert_eq!(body["unidade_id"].as_i64().unwrap(), unidade_id);
    }

    #[tokio::test]
    async fn test_duplicate_cpf_rolls_back_second_user() {
        let state = testing::test_state().await;
        let app = testing::app(state.clone());
        let unidade_id = testing::seed_unidade(&app).await;

        testing::seed_profissional(&app, "a@x.com", "52998224725", unidade_id).await;

        let (status, body) = testing::request(
            &app,
            "POST",
            "/profissionais",
            None,
            Some(json!({
                "nome_completo": "Dra. Ana Lima",
                "email": "b@x.com",
                "senha": "senha123",
                "cpf": "52998224725",
                "registro_conselho": "654321",
                "tipo_conselho": "CRM",
                "especialidade": "Dermatologia",
                "unidade_id": unidade_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "conflict");

        let orphan: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM usuarios WHERE email = 'b@x.com'")
                .fetch_one(&state.db)
                .await
                .unwrap();
        assert_eq!(orphan.0, 0);
    }

    #[tokio::test]
    async fn test_update_rejects_missing_unit() {
        let app = testing::app(testing::test_state().await);
        let unidade_id = testing::seed_unidade(&app).await;
        let id = testing::seed_profissional(&app, "a@x.com", "52998224725", unidade_id).await;

        let (status, _) = testing::request(
            &app,
            "PUT",
            &format!("/profissionais/{id}"),
            None,
            Some(json!({ "unidade_id": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // unchanged
        let (_, body) =
            testing::request(&app, "GET", &format!("/profissionais/{id}"), None, None).await;
        assert_eq!(body["unidade_id"].as_i64().unwrap(), unidade_id);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let app = testing::app(testing::test_state().await);
        let unidade_id = testing::seed_unidade(&app).await;
        let id = testing::seed_profissional(&app, "a@x.com", "52998224725", unidade_id).await;

        let (status, body) = testing::request(
            &app,
            "PUT",
            &format!("/profissionais/{id}"),
            None,
            Some(json!({ "especialidade": "Pediatria" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["especialidade"], "Pediatria");
        assert_eq!(body["registro_conselho"], "123456");
        assert_eq!(body["tipo_conselho"], "CRM");
    }
}
