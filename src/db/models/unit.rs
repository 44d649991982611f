//! Unidade model: hospitals, clinics, labs and home-care units.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unidade {
    pub id: i64,
    pub nome: String,
    pub tipo_unidade: String,
    pub endereco: String,
    pub telefone: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUnidadeRequest {
    pub nome: String,
    pub tipo_unidade: String,
    pub endereco: String,
    pub telefone: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUnidadeRequest {
    pub nome: Option<String>,
    pub tipo_unidade: Option<String>,
    pub endereco: Option<String>,
    pub telefone: Option<String>,
}
