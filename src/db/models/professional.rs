//! Profissional model: healthcare professional profile backed 1:1 by a Usuario.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profissional {
    pub id: i64,
    pub usuario_id: i64,
    pub cpf: String,
    pub registro_conselho: String,
    pub tipo_conselho: String,
    pub especialidade: String,
    pub unidade_id: i64,
}

/// Read view joining the professional row with its backing Usuario
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfissionalRead {
    pub id: i64,
    pub usuario_id: i64,
    pub nome_completo: String,
    pub email: String,
    pub cpf: String,
    pub registro_conselho: String,
    pub tipo_conselho: String,
    pub especialidade: String,
    pub unidade_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfissionalRequest {
    pub nome_completo: String,
    pub email: String,
    // used to create the backing Usuario
    pub senha: String,
    pub cpf: String,
    pub registro_conselho: String,
    pub tipo_conselho: String,
    pub especialidade: String,
    pub unidade_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfissionalRequest {
    pub registro_conselho: Option<String>,
    pub tipo_conselho: Option<String>,
    pub especialidade: Option<String>,
    pub unidade_id: Option<i64>,
}
