//! Modelo de Driver
//!
//! Este módulo contiene el struct Driver y sus DTOs para CRUD.
//! Los cambios de estado del conductor los inicia un administrador.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Estado del conductor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Active,
    Resting,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Active => "active",
            DriverStatus::Resting => "resting",
            DriverStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(DriverStatus::Active),
            "resting" => Some(DriverStatus::Resting),
            "suspended" => Some(DriverStatus::Suspended),
            _ => None,
        }
    }
}

/// Driver - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    pub vehicle_id: Option<Uuid>,
    pub driver_status: String,
    pub trip_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request para crear un nuevo conductor
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: String,

    #[validate(length(min = 5, max = 50))]
    pub license_number: String,

    pub license_expiry: Option<NaiveDate>,

    pub vehicle_id: Option<Uuid>,
}

/// Request para actualizar un conductor.
/// Reemplazo completo del recurso, incluido el estado (admin-initiated).
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub phone: String,

    #[validate(length(min = 5, max = 50))]
    pub license_number: String,

    pub license_expiry: Option<NaiveDate>,

    pub vehicle_id: Option<Uuid>,

    pub driver_status: DriverStatus,
}

/// Response de conductor para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub license_number: String,
    pub license_expiry: Option<NaiveDate>,
    pub vehicle_id: Option<Uuid>,
    pub driver_status: String,
    pub trip_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filtros para búsqueda de conductores
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DriverFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name,
            phone: driver.phone,
            license_number: driver.license_number,
            license_expiry: driver.license_expiry,
            vehicle_id: driver.vehicle_id,
            driver_status: driver.driver_status,
            trip_count: driver.trip_count,
            created_at: driver.created_at,
            updated_at: driver.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_status_roundtrip() {
        for status in [DriverStatus::Active, DriverStatus::Resting, DriverStatus::Suspended] {
            assert_eq!(DriverStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DriverStatus::parse("retired"), None);
    }

    #[test]
    fn test_create_driver_request_validation() {
        let valid = CreateDriverRequest {
            name: "Juan Dela Cruz".to_string(),
            phone: "0917-123-4567".to_string(),
            license_number: "N01-23-456789".to_string(),
            license_expiry: None,
            vehicle_id: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateDriverRequest {
            name: "J".to_string(),
            phone: "123".to_string(),
            license_number: "N01".to_string(),
            license_expiry: None,
            vehicle_id: None,
        };
        assert!(invalid.validate().is_err());
    }
}
