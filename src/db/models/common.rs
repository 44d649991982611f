//! Enumerated values shared across models.
//!
//! All of these are stored as TEXT columns; the enums exist so handlers can
//! reject values outside the documented sets at the API boundary.

use serde::{Deserialize, Serialize};

/// Account role of a Usuario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "PACIENTE")]
    Paciente,
    #[serde(rename = "PROFISSIONAL")]
    Profissional,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paciente => write!(f, "PACIENTE"),
            Self::Profissional => write!(f, "PROFISSIONAL"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PACIENTE" => Ok(Self::Paciente),
            "PROFISSIONAL" => Ok(Self::Profissional),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("Tipo de usuário desconhecido: {}", s)),
        }
    }
}

/// Kind of care unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnitKind {
    #[serde(rename = "HOSPITAL")]
    Hospital,
    #[serde(rename = "CLINICA")]
    Clinica,
    #[serde(rename = "LABORATORIO")]
    Laboratorio,
    #[serde(rename = "HOMECARE")]
    HomeCare,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hospital => write!(f, "HOSPITAL"),
            Self::Clinica => write!(f, "CLINICA"),
            Self::Laboratorio => write!(f, "LABORATORIO"),
            Self::HomeCare => write!(f, "HOMECARE"),
        }
    }
}

impl std::str::FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOSPITAL" => Ok(Self::Hospital),
            "CLINICA" => Ok(Self::Clinica),
            "LABORATORIO" => Ok(Self::Laboratorio),
            "HOMECARE" => Ok(Self::HomeCare),
            _ => Err(format!("Tipo de unidade desconhecido: {}", s)),
        }
    }
}

/// How a consultation is carried out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttendanceMode {
    #[serde(rename = "PRESENCIAL")]
    Presencial,
    #[serde(rename = "TELEMEDICINA")]
    Telemedicina,
}

impl std::fmt::Display for AttendanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Presencial => write!(f, "PRESENCIAL"),
            Self::Telemedicina => write!(f, "TELEMEDICINA"),
        }
    }
}

impl std::str::FromStr for AttendanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRESENCIAL" => Ok(Self::Presencial),
            "TELEMEDICINA" => Ok(Self::Telemedicina),
            _ => Err(format!("Tipo de atendimento desconhecido: {}", s)),
        }
    }
}

/// Consultation lifecycle states accepted by the status operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConsultationStatus {
    #[serde(rename = "AGENDADA")]
    Agendada,
    #[serde(rename = "CONFIRMADA")]
    Confirmada,
    #[serde(rename = "CONCLUIDA")]
    Concluida,
    #[serde(rename = "CANCELADA")]
    Cancelada,
}

impl Default for ConsultationStatus {
    fn default() -> Self {
        Self::Agendada
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agendada => write!(f, "AGENDADA"),
            Self::Confirmada => write!(f, "CONFIRMADA"),
            Self::Concluida => write!(f, "CONCLUIDA"),
            Self::Cancelada => write!(f, "CANCELADA"),
        }
    }
}

impl std::str::FromStr for ConsultationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGENDADA" => Ok(Self::Agendada),
            "CONFIRMADA" => Ok(Self::Confirmada),
            "CONCLUIDA" => Ok(Self::Concluida),
            "CANCELADA" => Ok(Self::Cancelada),
            _ => Err(format!("Status de consulta desconhecido: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_user_role_round_trip() {
        for value in ["PACIENTE", "PROFISSIONAL", "ADMIN"] {
            assert_eq!(UserRole::from_str(value).unwrap().to_string(), value);
        }
        assert!(UserRole::from_str("MEDICO").is_err());
        assert!(UserRole::from_str("paciente").is_err());
    }

    #[test]
    fn test_unit_kind_round_trip() {
        for value in ["HOSPITAL", "CLINICA", "LABORATORIO", "HOMECARE"] {
            assert_eq!(UnitKind::from_str(value).unwrap().to_string(), value);
        }
        assert!(UnitKind::from_str("FARMACIA").is_err());
    }

    #[test]
    fn test_attendance_mode_round_trip() {
        assert_eq!(
            AttendanceMode::from_str("PRESENCIAL").unwrap(),
            AttendanceMode::Presencial
        );
        assert_eq!(
            AttendanceMode::from_str("TELEMEDICINA").unwrap(),
            AttendanceMode::Telemedicina
        );
        assert!(AttendanceMode::from_str("REMOTO").is_err());
    }

    #[test]
    fn test_consultation_status_set_is_closed() {
        for value in ["AGENDADA", "CONFIRMADA", "CONCLUIDA", "CANCELADA"] {
            assert_eq!(
                ConsultationStatus::from_str(value).unwrap().to_string(),
                value
            );
        }
        assert!(ConsultationStatus::from_str("REMARCADA").is_err());
    }
}
