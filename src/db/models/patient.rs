//! Paciente model: patient profile backed 1:1 by a Usuario.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Paciente {
    pub id: i64,
    pub usuario_id: i64,
    pub cpf: String,
    pub data_nascimento: String,
    pub telefone: String,
    pub endereco: String,
    pub plano_saude: Option<String>,
    pub numero_carteirinha: Option<String>,
}

/// Read view joining the patient row with its backing Usuario
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PacienteRead {
    pub id: i64,
    pub usuario_id: i64,
    pub nome_completo: String,
    pub email: String,
    pub cpf: String,
    pub data_nascimento: String,
    pub telefone: String,
    pub endereco: String,
    pub plano_saude: Option<String>,
    pub numero_carteirinha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePacienteRequest {
    pub nome_completo: String,
    pub email: String,
    // used to create the backing Usuario
    pub senha: String,
    pub cpf: String,
    pub data_nascimento: NaiveDate,
    pub telefone: String,
    pub endereco: String,
    pub plano_saude: Option<String>,
    pub numero_carteirinha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePacienteRequest {
    pub telefone: Option<String>,
    pub endereco: Option<String>,
    pub plano_saude: Option<String>,
    pub numero_carteirinha: Option<String>,
}
