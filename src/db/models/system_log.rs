//! Append-only system log for tracking user actions.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// One recorded action. Rows are write-once: no update or delete path exists.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogSistema {
    pub id: i64,
    /// Null for actions without an authenticated user (e.g. failed login)
    pub usuario_id: Option<i64>,
    pub acao: String,
    pub detalhes: Option<String>,
    pub criado_em: String,
}

/// Response for listing log entries with pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogListResponse {
    pub items: Vec<LogSistema>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Query parameters for filtering log entries
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogQuery {
    /// Filter by action code (e.g. "CRIAR_CONSULTA")
    pub acao: Option<String>,
    /// Filter by acting user
    pub usuario_id: Option<i64>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
    /// Items per page (defaults to 50, max 100)
    pub per_page: Option<i64>,
}

/// Action codes recorded in the log
pub mod actions {
    pub const LOGIN_SUCESSO: &str = "LOGIN_SUCESSO";
    pub const LOGIN_FALHA: &str = "LOGIN_FALHA";

    pub const CRIAR_CONSULTA: &str = "CRIAR_CONSULTA";
    pub const ATUALIZAR_CONSULTA: &str = "ATUALIZAR_CONSULTA";
    pub const ATUALIZAR_STATUS_CONSULTA: &str = "ATUALIZAR_STATUS_CONSULTA";

    pub const CRIAR_PRONTUARIO: &str = "CRIAR_PRONTUARIO";
}

/// Insert one log row. The caller decides whether a failure matters; the API
/// layer wraps this with a best-effort helper that only warns.
pub async fn log_action(
    db: &SqlitePool,
    acao: &str,
    usuario_id: Option<i64>,
    detalhes: Option<&str>,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO logs_sistema (usuario_id, acao, detalhes, criado_em) VALUES (?, ?, ?, ?)")
        .bind(usuario_id)
        .bind(acao)
        .bind(detalhes)
        .bind(&now)
        .execute(db)
        .await?;

    tracing::debug!(acao = acao, usuario_id = usuario_id, "Log entry recorded");

    Ok(())
}

/// List log entries with filtering and pagination, newest first
pub async fn list_log_entries(
    db: &SqlitePool,
    query: &LogQuery,
) -> Result<LogListResponse, sqlx::Error> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions = Vec::new();
    if query.acao.is_some() {
        conditions.push("acao = ?");
    }
    if query.usuario_id.is_some() {
        conditions.push("usuario_id = ?");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM logs_sistema {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(acao) = &query.acao {
        count_query = count_query.bind(acao);
    }
    if let Some(usuario_id) = query.usuario_id {
        count_query = count_query.bind(usuario_id);
    }
    let total = count_query.fetch_one(db).await?;

    let sql = format!(
        "SELECT * FROM logs_sistema {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut list_query = sqlx::query_as::<_, LogSistema>(&sql);
    if let Some(acao) = &query.acao {
        list_query = list_query.bind(acao);
    }
    if let Some(usuario_id) = query.usuario_id {
        list_query = list_query.bind(usuario_id);
    }
    list_query = list_query.bind(per_page).bind(offset);

    let items = list_query.fetch_all(db).await?;

    let total_pages = (total as f64 / per_page as f64).ceil() as i64;

    Ok(LogListResponse {
        items,
        total,
        page,
        per_page,
        total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn test_log_action_writes_row_without_user() {
        let pool = db::init_memory().await.unwrap();

        log_action(&pool, actions::LOGIN_FALHA, None, Some("email=x@y.com"))
            .await
            .unwrap();

        let result = list_log_entries(&pool, &LogQuery::default()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].acao, "LOGIN_FALHA");
        assert_eq!(result.items[0].usuario_id, None);
        assert_eq!(result.items[0].detalhes.as_deref(), Some("email=x@y.com"));
    }

    #[tokio::test]
    async fn test_list_filters_by_action() {
        let pool = db::init_memory().await.unwrap();

        log_action(&pool, actions::LOGIN_FALHA, None, None)
            .await
            .unwrap();
        log_action(&pool, actions::LOGIN_FALHA, None, None)
            .await
            .unwrap();
        log_action(&pool, actions::CRIAR_CONSULTA, None, None)
            .await
            .unwrap();

        let query = LogQuery {
            acao: Some("LOGIN_FALHA".to_string()),
            ..Default::default()
        };
        let result = list_log_entries(&pool, &query).await.unwrap();
        assert_eq!(result.total, 2);
        assert!(result.items.iter().all(|l| l.acao == "LOGIN_FALHA"));
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let pool = db::init_memory().await.unwrap();

        for i in 0..5 {
            let detalhes = format!("n={i}");
            log_action(&pool, actions::CRIAR_CONSULTA, None, Some(detalhes.as_str()))
                .await
                .unwrap();
        }

        let query = LogQuery {
            page: Some(1),
            per_page: Some(2),
            ..Default::default()
        };
        let result = list_log_entries(&pool, &query).await.unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].detalhes.as_deref(), Some("n=4"));
    }
}
