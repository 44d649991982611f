//! Usuario model: root identity for login.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Usuario {
    pub id: i64,
    pub nome_completo: String,
    pub email: String,
    pub senha_hash: String,
    pub tipo: String,
    pub criado_em: String,
    pub atualizado_em: String,
}

/// Public view of a Usuario (never exposes the password digest)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsuarioRead {
    pub id: i64,
    pub nome_completo: String,
    pub email: String,
    pub tipo: String,
}

impl From<Usuario> for UsuarioRead {
    fn from(user: Usuario) -> Self {
        Self {
            id: user.id,
            nome_completo: user.nome_completo,
            email: user.email,
            tipo: user.tipo,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nome_completo: String,
    pub email: String,
    pub senha: String,
    pub tipo: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
