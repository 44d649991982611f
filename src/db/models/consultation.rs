//! Consulta model: a scheduled appointment between a patient and a
//! professional at a care unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Consulta {
    pub id: i64,
    pub paciente_id: i64,
    pub profissional_id: i64,
    pub unidade_id: i64,
    pub data_hora: String,
    pub tipo_atendimento: String,
    pub status: String,
    pub observacoes: Option<String>,
    pub criada_em: String,
    pub atualizada_em: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateConsultaRequest {
    pub paciente_id: i64,
    pub profissional_id: i64,
    pub unidade_id: i64,
    pub data_hora: DateTime<Utc>,
    pub tipo_atendimento: String,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConsultaRequest {
    pub paciente_id: Option<i64>,
    pub profissional_id: Option<i64>,
    pub unidade_id: Option<i64>,
    pub data_hora: Option<DateTime<Utc>>,
    pub tipo_atendimento: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConsultaStatusRequest {
    pub status: String,
}
