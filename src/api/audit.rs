//! System log API endpoint and best-effort recording helper.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::db::{list_log_entries, log_action, LogListResponse, LogQuery};
use crate::AppState;

use super::error::ApiError;

/// Record an action in the system log. Best-effort: the primary operation has
/// already committed, so a failed log write is reported in the process log and
/// otherwise ignored.
pub async fn record(
    state: &AppState,
    acao: &str,
    usuario_id: Option<i64>,
    detalhes: Option<String>,
) {
    if let Err(e) = log_action(&state.db, acao, usuario_id, detalhes.as_deref()).await {
        tracing::warn!(
            acao = acao,
            usuario_id = usuario_id,
            error = %e,
            "Failed to write system log entry"
        );
    }
}

/// List system log entries with filtering and pagination
///
/// GET /logs
///
/// Query parameters:
/// - acao: filter by action code (e.g. "CRIAR_CONSULTA")
/// - usuario_id: filter by acting user
/// - page: page number (1-indexed, defaults to 1)
/// - per_page: items per page (defaults to 50, max 100)
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogListResponse>, ApiError> {
    let result = list_log_entries(&state.db, &query).await?;
    Ok(Json(result))
}
