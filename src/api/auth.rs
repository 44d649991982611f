//! Authentication: password hashing, access tokens, login/register endpoints
//! and the identity extractor used by protected routes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::{
    actions, LoginRequest, RegisterRequest, TokenResponse, Usuario, UsuarioRead,
};
use crate::AppState;

use super::audit;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_required, validate_senha, validate_user_role};

/// Errors from the credential and token service
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Credenciais inválidas.")]
    InvalidCredentials,
    #[error("Token inválido ou expirado.")]
    InvalidToken,
    #[error("Falha ao gerar token.")]
    TokenCreation,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation => ApiError::internal(err.to_string()),
            _ => ApiError::unauthorized(err.to_string()),
        }
    }
}

/// Claims embedded in every access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a string
    pub sub: String,
    /// Account role ("PACIENTE", "PROFISSIONAL", "ADMIN")
    pub tipo: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Issue a signed HS256 access token for a user
pub fn create_access_token(
    user_id: i64,
    tipo: &str,
    auth: &AuthConfig,
) -> Result<String, AuthError> {
    let exp = chrono::Utc::now() + chrono::Duration::minutes(auth.token_ttl_minutes);

    let claims = Claims {
        sub: user_id.to_string(),
        tipo: tipo.to_string(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret_key.as_bytes()),
    )
    .map_err(|_| AuthError::TokenCreation)
}

/// Verify signature and expiry, recovering the claims.
/// Malformed, tampered and expired tokens all fail the same way.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Register endpoint
///
/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UsuarioRead>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_required(&request.nome_completo, "Nome completo") {
        errors.add("nome_completo", e);
    }
    if let Err(e) = validate_email(&request.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_senha(&request.senha) {
        errors.add("senha", e);
    }
    if let Err(e) = validate_user_role(&request.tipo) {
        errors.add("tipo", e);
    }
    errors.finish()?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM usuarios WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("E-mail já cadastrado."));
    }

    let senha_hash =
        hash_password(&request.senha).map_err(|_| ApiError::internal("Falha ao gerar hash de senha."))?;
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO usuarios (nome_completo, email, senha_hash, tipo, criado_em, atualizado_em) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&request.nome_completo)
    .bind(&request.email)
    .bind(&senha_hash)
    .bind(&request.tipo)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("E-mail já cadastrado.")
        }
        _ => ApiError::from(e),
    })?;

    let user: Usuario = sqlx::query_as("SELECT * FROM usuarios WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    tracing::info!(email = %user.email, tipo = %user.tipo, "User registered");

    Ok((StatusCode::CREATED, Json(UsuarioRead::from(user))))
}

/// Login endpoint: verify credentials, issue a bearer token
///
/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user: Option<Usuario> = sqlx::query_as("SELECT * FROM usuarios WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    // Unknown email and wrong password produce the same response shape
    let user = match user {
        Some(user) if verify_password(&request.senha, &user.senha_hash) => user,
        _ => {
            audit::record(
                &state,
                actions::LOGIN_FALHA,
                None,
                Some(format!("email={}", request.email)),
            )
            .await;
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let token = create_access_token(user.id, &user.tipo, &state.config.auth)?;

    audit::record(&state, actions::LOGIN_SUCESSO, Some(user.id), None).await;

    Ok(Json(TokenResponse::bearer(token)))
}

/// Ensure the bootstrap admin user exists. Idempotent: keyed on email.
pub async fn ensure_admin_user(db: &crate::DbPool, auth: &AuthConfig) -> anyhow::Result<()> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM usuarios WHERE email = ?")
        .bind(&auth.admin_email)
        .fetch_optional(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let senha_hash = hash_password(&auth.admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO usuarios (nome_completo, email, senha_hash, tipo, criado_em, atualizado_em) \
         VALUES (?, ?, ?, 'ADMIN', ?, ?)",
    )
    .bind(&auth.admin_name)
    .bind(&auth.admin_email)
    .bind(&senha_hash)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::info!(email = %auth.admin_email, "Created bootstrap admin user");

    Ok(())
}

/// Extract the bearer token from request headers
fn extract_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Resolve the authenticated user behind a token
pub async fn get_current_user(
    pool: &sqlx::SqlitePool,
    secret: &str,
    token: &str,
) -> Result<Usuario, ApiError> {
    let claims = decode_access_token(token, secret)?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::from(AuthError::InvalidToken))?;

    let user: Option<Usuario> = sqlx::query_as("SELECT * FROM usuarios WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(|| AuthError::InvalidToken.into())
}

/// Extractor for the current authenticated user. Protected handlers take a
/// `Usuario` argument and never run when authentication fails.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Usuario {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(&parts.headers).ok_or_else(|| ApiError::from(AuthError::InvalidToken))?;
        get_current_user(&state.db, &state.config.auth.secret_key, token).await
    }
}

/// Auth middleware guarding the protected sub-router
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::from(AuthError::InvalidToken))?;

    decode_access_token(token, &state.config.auth.secret_key)?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            secret_key: "segredo-de-teste".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("senha123").unwrap();
        assert_ne!(hash, "senha123");
        assert!(verify_password("senha123", &hash));
        assert!(!verify_password("senha124", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("senha123", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = test_auth_config();
        let token = create_access_token(42, "PACIENTE", &auth).unwrap();

        let claims = decode_access_token(&token, &auth.secret_key).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.tipo, "PACIENTE");
    }

    #[test]
    fn test_token_near_expiry_still_accepted() {
        // 59 minutes into a 60-minute token: one minute of validity left
        let auth = test_auth_config();
        let claims = Claims {
            sub: "1".to_string(),
            tipo: "ADMIN".to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::minutes(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(auth.secret_key.as_bytes()),
        )
        .unwrap();

        assert!(decode_access_token(&token, &auth.secret_key).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        // 61 minutes into a 60-minute token, outside any decoder leeway
        let auth = test_auth_config();
        let claims = Claims {
            sub: "1".to_string(),
            tipo: "ADMIN".to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::minutes(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(auth.secret_key.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decode_access_token(&token, &auth.secret_key),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = test_auth_config();
        let token = create_access_token(42, "PACIENTE", &auth).unwrap();

        assert!(decode_access_token(&token, "outro-segredo").is_err());
        assert!(decode_access_token("garbage.token.value", &auth.secret_key).is_err());
    }

    #[tokio::test]
    async fn test_ensure_admin_user_is_idempotent() {
        let pool = crate::db::init_memory().await.unwrap();
        let auth = test_auth_config();

        ensure_admin_user(&pool, &auth).await.unwrap();
        ensure_admin_user(&pool, &auth).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usuarios WHERE tipo = 'ADMIN'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
