//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus DTOs para CRUD.
//! La matrícula (plate) es única; un vehículo tiene 0 o 1 conductor asignado.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Estado del vehículo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Maintenance,
    Inactive,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(VehicleStatus::Active),
            "maintenance" => Some(VehicleStatus::Maintenance),
            "inactive" => Some(VehicleStatus::Inactive),
            _ => None,
        }
    }
}

/// Vehicle - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub vehicle_type: String,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub capacity: i32,
    pub vehicle_status: String,
    pub driver_id: Option<Uuid>,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request para crear un nuevo vehículo
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom = "crate::utils::validation::validate_license_plate")]
    pub plate: String,

    #[validate(length(min = 2, max = 50))]
    pub vehicle_type: String,

    #[validate(length(min = 2, max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1950, max = 2030))]
    pub year: Option<i32>,

    #[validate(length(min = 2, max = 50))]
    pub color: Option<String>,

    #[validate(range(min = 1, max = 100))]
    pub capacity: i32,

    pub driver_id: Option<Uuid>,

    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
}

/// Request para actualizar un vehículo.
/// Reemplazo completo del recurso, incluido el estado.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(custom = "crate::utils::validation::validate_license_plate")]
    pub plate: String,

    #[validate(length(min = 2, max = 50))]
    pub vehicle_type: String,

    #[validate(length(min = 2, max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1950, max = 2030))]
    pub year: Option<i32>,

    #[validate(length(min = 2, max = 50))]
    pub color: Option<String>,

    #[validate(range(min = 1, max = 100))]
    pub capacity: i32,

    pub vehicle_status: VehicleStatus,

    pub driver_id: Option<Uuid>,

    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
}

/// Response de vehículo para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub plate: String,
    pub vehicle_type: String,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub capacity: i32,
    pub vehicle_status: String,
    pub driver_id: Option<Uuid>,
    pub registration_expiry: Option<NaiveDate>,
    pub insurance_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VehicleFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            plate: vehicle.plate,
            vehicle_type: vehicle.vehicle_type,
            model: vehicle.model,
            year: vehicle.year,
            color: vehicle.color,
            capacity: vehicle.capacity,
            vehicle_status: vehicle.vehicle_status,
            driver_id: vehicle.driver_id,
            registration_expiry: vehicle.registration_expiry,
            insurance_expiry: vehicle.insurance_expiry,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_status_roundtrip() {
        for status in [VehicleStatus::Active, VehicleStatus::Maintenance, VehicleStatus::Inactive] {
            assert_eq!(VehicleStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(VehicleStatus::parse("scrapped"), None);
    }

    #[test]
    fn test_create_vehicle_request_validation() {
        let valid = CreateVehicleRequest {
            plate: "ABC-1234".to_string(),
            vehicle_type: "Van".to_string(),
            model: Some("Toyota Hiace".to_string()),
            year: Some(2020),
            color: Some("White".to_string()),
            capacity: 15,
            driver_id: None,
            registration_expiry: None,
            insurance_expiry: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateVehicleRequest {
            plate: "A".to_string(),
            vehicle_type: "V".to_string(),
            model: None,
            year: Some(1800),
            color: None,
            capacity: 0,
            driver_id: None,
            registration_expiry: None,
            insurance_expiry: None,
        };
        assert!(invalid.validate().is_err());
    }
}
