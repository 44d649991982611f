//! Prontuario model: a clinical record entry for a patient.
//!
//! `data_registro` is server-assigned at insert time and immutable; there is
//! no update operation on this entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prontuario {
    pub id: i64,
    pub paciente_id: i64,
    pub profissional_id: i64,
    pub consulta_id: Option<i64>,
    pub data_registro: String,
    pub descricao: String,
    pub tipo_registro: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProntuarioRequest {
    pub paciente_id: i64,
    pub profissional_id: i64,
    pub consulta_id: Option<i64>,
    pub descricao: String,
    // e.g. "EVOLUCAO", "PRESCRICAO", "ALTA"
    pub tipo_registro: String,
}
