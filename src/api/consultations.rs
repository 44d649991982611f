//! Consultation (consulta) endpoints. All routes require a bearer token;
//! state-changing operations are recorded in the system log attributed to the
//! authenticated user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    actions, Consulta, ConsultationStatus, CreateConsultaRequest, UpdateConsultaRequest,
    UpdateConsultaStatusRequest, Usuario,
};
use crate::AppState;

use super::audit;
use super::error::ApiError;
use super::validation::{validate_attendance_mode, validate_consultation_status};

async fn patient_exists(db: &crate::DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM pacientes WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

async fn professional_exists(db: &crate::DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM profissionais WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

async fn unit_exists(db: &crate::DbPool, id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM unidades WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

/// Schedule a consultation
///
/// POST /consultas
pub async fn create_consultation(
    State(state): State<Arc<AppState>>,
    user: Usuario,
    Json(req): Json<CreateConsultaRequest>,
) -> Result<(StatusCode, Json<Consulta>), ApiError> {
    validate_attendance_mode(&req.tipo_atendimento)
        .map_err(|e| ApiError::validation_field("tipo_atendimento", e))?;

    if !patient_exists(&state.db, req.paciente_id).await? {
        return Err(ApiError::bad_request("Paciente não encontrado."));
    }
    if !professional_exists(&state.db, req.profissional_id).await? {
        return Err(ApiError::bad_request("Profissional não encontrado."));
    }
    if !unit_exists(&state.db, req.unidade_id).await? {
        return Err(ApiError::bad_request("Unidade não encontrada."));
    }

    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO consultas \
            (paciente_id, profissional_id, unidade_id, data_hora, tipo_atendimento, status, observacoes, criada_em, atualizada_em) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(req.paciente_id)
    .bind(req.profissional_id)
    .bind(req.unidade_id)
    .bind(req.data_hora.to_rfc3339())
    .bind(&req.tipo_atendimento)
    .bind(ConsultationStatus::default().to_string())
    .bind(&req.observacoes)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let consulta: Consulta = sqlx::query_as("SELECT * FROM consultas WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    audit::record(
        &state,
        actions::CRIAR_CONSULTA,
        Some(user.id),
        Some(format!(
            "Consulta ID={} criada pelo usuário ID={}",
            consulta.id, user.id
        )),
    )
    .await;

    Ok((StatusCode::CREATED, Json(consulta)))
}

/// List all consultations
///
/// GET /consultas
pub async fn list_consultations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Consulta>>, ApiError> {
    let consultas = sqlx::query_as::<_, Consulta>("SELECT * FROM consultas ORDER BY id")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(consultas))
}

/// Get a consultation by id
///
/// GET /consultas/:id
pub async fn get_consultation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Consulta>, ApiError> {
    let consulta = sqlx::query_as::<_, Consulta>("SELECT * FROM consultas WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Consulta não encontrada."))?;

    Ok(Json(consulta))
}

/// List consultations of one patient
///
/// GET /consultas/pacientes/:id
pub async fn list_by_patient(
    State(state): State<Arc<AppState>>,
    Path(paciente_id): Path<i64>,
) -> Result<Json<Vec<Consulta>>, ApiError> {
    let consultas =
        sqlx::query_as::<_, Consulta>("SELECT * FROM consultas WHERE paciente_id = ? ORDER BY id")
            .bind(paciente_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(consultas))
}

/// List consultations of one professional
///
/// GET /consultas/profissionais/:id
pub async fn list_by_professional(
    State(state): State<Arc<AppState>>,
    Path(profissional_id): Path<i64>,
) -> Result<Json<Vec<Consulta>>, ApiError> {
    let consultas = sqlx::query_as::<_, Consulta>(
        "SELECT * FROM consultas WHERE profissional_id = ? ORDER BY id",
    )
    .bind(profissional_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(consultas))
}

/// Update a consultation. Only provided fields are changed; changed references
/// must point at existing rows. Status is changed through its own operation.
///
/// PUT /consultas/:id
pub async fn update_consultation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Usuario,
    Json(req): Json<UpdateConsultaRequest>,
) -> Result<Json<Consulta>, ApiError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM consultas WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Consulta não encontrada."));
    }

    if let Some(tipo_atendimento) = &req.tipo_atendimento {
        validate_attendance_mode(tipo_atendimento)
            .map_err(|e| ApiError::validation_field("tipo_atendimento", e))?;
    }

    if let Some(paciente_id) = req.paciente_id {
        if !patient_exists(&state.db, paciente_id).await? {
            return Err(ApiError::bad_request("Paciente não encontrado."));
        }
    }
    if let Some(profissional_id) = req.profissional_id {
        if !professional_exists(&state.db, profissional_id).await? {
            return Err(ApiError::bad_request("Profissional não encontrado."));
        }
    }
    if let Some(unidade_id) = req.unidade_id {
        if !unit_exists(&state.db, unidade_id).await? {
            return Err(ApiError::bad_request("Unidade não encontrada."));
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE consultas SET \
            paciente_id = COALESCE(?, paciente_id), \
            profissional_id = COALESCE(?, profissional_id), \
            unidade_id = COALESCE(?, unidade_id), \
            data_hora = COALESCE(?, data_hora), \
            tipo_atendimento = COALESCE(?, tipo_atendimento), \
            observacoes = COALESCE(?, observacoes), \
            atualizada_em = ? \
         WHERE id = ?",
    )
    .bind(req.paciente_id)
    .bind(req.profissional_id)
    .bind(req.unidade_id)
    .bind(req.data_hora.map(|d| d.to_rfc3339()))
    .bind(&req.tipo_atendimento)
    .bind(&req.observacoes)
    .bind(&now)
    .bind(id)
    .execute(&state.db)
    .await?;

    let consulta: Consulta = sqlx::query_as("SELECT * FROM consultas WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    audit::record(
        &state,
        actions::ATUALIZAR_CONSULTA,
        Some(user.id),
        Some(format!(
            "Consulta ID={} atualizada pelo usuário ID={}",
            consulta.id, user.id
        )),
    )
    .await;

    Ok(Json(consulta))
}

/// Change the status of a consultation
///
/// PATCH /consultas/:id/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    user: Usuario,
    Json(req): Json<UpdateConsultaStatusRequest>,
) -> Result<Json<Consulta>, ApiError> {
    let status = validate_consultation_status(&req.status)
        .map_err(|e| ApiError::validation_field("status", e))?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM consultas WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Consulta não encontrada."));
    }

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE consultas SET status = ?, atualizada_em = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(&now)
        .bind(id)
        .execute(&state.db)
        .await?;

    let consulta: Consulta = sqlx::query_as("SELECT * FROM consultas WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    audit::record(
        &state,
        actions::ATUALIZAR_STATUS_CONSULTA,
        Some(user.id),
        Some(format!(
            "Status da consulta ID={} atualizado para {} pelo usuário ID={}",
            consulta.id, consulta.status, user.id
        )),
    )
    .await;

    Ok(Json(consulta))
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use axum::http::StatusCode;
    use serde_json::json;

    struct Fixture {
        token: String,
        paciente_id: i64,
        profissional_id: i64,
        unidade_id: i64,
    }

    async fn fixture(app: &axum::Router) -> Fixture {
        let token = testing::login_token(app, "admin-teste@x.com").await;
        let unidade_id = testing::seed_unidade(app).await;
        let paciente_id = testing::seed_paciente(app, "paciente@x.com", "39053344705").await;
        let profissional_id =
            testing::seed_profissional(app, "medico@x.com", "52998224725", unidade_id).await;
        Fixture {
            token,
            paciente_id,
            profissional_id,
            unidade_id,
        }
    }

    fn consulta_payload(f: &Fixture) -> serde_json::Value {
        json!({
            "paciente_id": f.paciente_id,
            "profissional_id": f.profissional_id,
            "unidade_id": f.unidade_id,
            "data_hora": "2026-09-01T14:30:00Z",
            "tipo_atendimento": "PRESENCIAL",
            "observacoes": "Retorno"
        })
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        let app = testing::app(testing::test_state().await);

        let (status, _) = testing::request(&app, "GET", "/consultas", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_defaults_to_scheduled_and_audits() {
        let state = testing::test_state().await;
        let app = testing::app(state.clone());
        let f = fixture(&app).await;

        let (status, body) = testing::request(
            &app,
            "POST",
            "/consultas",
            Some(&f.token),
            Some(consulta_payload(&f)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "AGENDADA");
        let id = body["id"].as_i64().unwrap();

        // audit row carries the real consultation id and the acting user
        let log: (String, Option<i64>, Option<String>) = sqlx::query_as(
            "SELECT acao, usuario_id, detalhes FROM logs_sistema WHERE acao = 'CRIAR_CONSULTA'",
        )
        .fetch_one(&state.db)
        .await
        .unwrap();
        assert!(log.1.is_some());
        assert!(log.2.unwrap().contains(&format!("Consulta ID={id}")));
    }

    #[tokio::test]
    async fn test_create_with_missing_professional_writes_nothing() {
        let state = testing::test_state().await;
        let app = testing::app(state.clone());
        let f = fixture(&app).await;

        let mut payload = consulta_payload(&f);
        payload["profissional_id"] = json!(99);

        let (status, body) =
            testing::request(&app, "POST", "/consultas", Some(&f.token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Profissional não encontrado.");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM consultas")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_attendance_mode() {
        let app = testing::app(testing::test_state().await);
        let f = fixture(&app).await;

        let mut payload = consulta_payload(&f);
        payload["tipo_atendimento"] = json!("DOMICILIAR");

        let (status, body) =
            testing::request(&app, "POST", "/consultas", Some(&f.token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_partial_update_checks_changed_references() {
        let app = testing::app(testing::test_state().await);
        let f = fixture(&app).await;

        let (_, body) = testing::request(
            &app,
            "POST",
            "/consultas",
            Some(&f.token),
            Some(consulta_payload(&f)),
        )
        .await;
        let id = body["id"].as_i64().unwrap();

        let (status, _) = testing::request(
            &app,
            "PUT",
            &format!("/consultas/{id}"),
            Some(&f.token),
            Some(json!({ "unidade_id": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = testing::request(
            &app,
            "PUT",
            &format!("/consultas/{id}"),
            Some(&f.token),
            Some(json!({ "observacoes": "Paciente remarcou" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["observacoes"], "Paciente remarcou");
        assert_eq!(body["tipo_atendimento"], "PRESENCIAL");
        assert_eq!(body["unidade_id"].as_i64().unwrap(), f.unidade_id);
    }

    #[tokio::test]
    async fn test_status_update_enforces_closed_set() {
        let app = testing::app(testing::test_state().await);
        let f = fixture(&app).await;

        let (_, body) = testing::request(
            &app,
            "POST",
            "/consultas",
            Some(&f.token),
            Some(consulta_payload(&f)),
        )
        .await;
        let id = body["id"].as_i64().unwrap();

        let (status, _) = testing::request(
            &app,
            "PATCH",
            &format!("/consultas/{id}/status"),
            Some(&f.token),
            Some(json!({ "status": "REMARCADA" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = testing::request(
            &app,
            "PATCH",
            &format!("/consultas/{id}/status"),
            Some(&f.token),
            Some(json!({ "status": "CONFIRMADA" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "CONFIRMADA");
    }

    #[tokio::test]
    async fn test_filtered_listings() {
        let app = testing::app(testing::test_state().await);
        let f = fixture(&app).await;

        testing::request(
            &app,
            "POST",
            "/consultas",
            Some(&f.token),
            Some(consulta_payload(&f)),
        )
        .await;

        let (status, body) = testing::request(
            &app,
            "GET",
            &format!("/consultas/pacientes/{}", f.paciente_id),
            Some(&f.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = testing::request(
            &app,
            "GET",
            "/consultas/profissionais/99",
            Some(&f.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }
}
