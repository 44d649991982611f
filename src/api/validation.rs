//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an
//! ApiError, use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

use crate::db::{AttendanceMode, ConsultationStatus, UnitKind, UserRole};

lazy_static! {
    /// Regex for validating email addresses
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)+$"
    ).unwrap();

    /// Regex for validating CPF: exactly 11 digits, punctuation stripped by the caller
    static ref CPF_REGEX: Regex = Regex::new(r"^\d{11}$").unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("E-mail é obrigatório.".to_string());
    }

    if email.len() > 254 {
        return Err("E-mail é muito longo (máx. 254 caracteres).".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Formato de e-mail inválido.".to_string());
    }

    Ok(())
}

/// Validate a CPF (11 digits, separators allowed)
pub fn validate_cpf(cpf: &str) -> Result<(), String> {
    if cpf.is_empty() {
        return Err("CPF é obrigatório.".to_string());
    }

    let digits: String = cpf.chars().filter(|c| *c != '.' && *c != '-').collect();
    if !CPF_REGEX.is_match(&digits) {
        return Err("CPF deve conter 11 dígitos.".to_string());
    }

    Ok(())
}

/// Normalize a CPF to its 11-digit form for storage and uniqueness checks
pub fn normalize_cpf(cpf: &str) -> String {
    cpf.chars().filter(|c| *c != '.' && *c != '-').collect()
}

/// Validate a password for account creation
pub fn validate_senha(senha: &str) -> Result<(), String> {
    if senha.is_empty() {
        return Err("Senha é obrigatória.".to_string());
    }

    if senha.len() < 6 {
        return Err("Senha deve ter no mínimo 6 caracteres.".to_string());
    }

    if senha.len() > 128 {
        return Err("Senha é muito longa (máx. 128 caracteres).".to_string());
    }

    Ok(())
}

/// Validate a required free-text field
pub fn validate_required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} é obrigatório.", label));
    }

    Ok(())
}

/// Validate a user role string
pub fn validate_user_role(tipo: &str) -> Result<UserRole, String> {
    UserRole::from_str(tipo)
        .map_err(|_| "Tipo inválido. Valores aceitos: PACIENTE, PROFISSIONAL, ADMIN.".to_string())
}

/// Validate a unit kind string
pub fn validate_unit_kind(tipo: &str) -> Result<UnitKind, String> {
    UnitKind::from_str(tipo).map_err(|_| {
        "Tipo de unidade inválido. Valores aceitos: HOSPITAL, CLINICA, LABORATORIO, HOMECARE."
            .to_string()
    })
}

/// Validate an attendance mode string
pub fn validate_attendance_mode(tipo: &str) -> Result<AttendanceMode, String> {
    AttendanceMode::from_str(tipo).map_err(|_| {
        "Tipo de atendimento inválido. Valores aceitos: PRESENCIAL, TELEMEDICINA.".to_string()
    })
}

/// Validate a consultation status string
pub fn validate_consultation_status(status: &str) -> Result<ConsultationStatus, String> {
    ConsultationStatus::from_str(status).map_err(|_| {
        "Status inválido. Valores aceitos: AGENDADA, CONFIRMADA, CONCLUIDA, CANCELADA.".to_string()
    })
}
