//! Modelo de Route
//!
//! Este módulo contiene el struct Route y sus DTOs para CRUD.
//! Una ruta es dueña del orden de su cola de despacho.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Route - mapea exactamente a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub start_location: String,
    pub end_location: String,
    pub distance: Decimal,
    pub price_per_passenger: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Route con contadores derivados para listados
#[derive(Debug, Clone, FromRow)]
pub struct RouteWithStats {
    pub id: Uuid,
    pub name: String,
    pub start_location: String,
    pub end_location: String,
    pub distance: Decimal,
    pub price_per_passenger: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub queue_count: i64,
    pub driver_count: i64,
    pub trip_count: i64,
    pub total_revenue: Option<Decimal>,
}

/// Request para crear una nueva ruta
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateRouteRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(length(min = 2, max = 100))]
    pub start_location: String,

    #[validate(length(min = 2, max = 100))]
    pub end_location: String,

    #[validate(custom = "crate::utils::validation::validate_non_negative_decimal")]
    pub distance: Decimal,

    #[validate(custom = "crate::utils::validation::validate_non_negative_decimal")]
    pub price_per_passenger: Decimal,

    pub is_active: bool,
}

/// Request para actualizar una ruta.
/// Reemplazo completo del recurso: el caller debe enviar todos los campos,
/// fusionando el estado previo con sus ediciones antes de llamar.
pub type UpdateRouteRequest = CreateRouteRequest;

/// Response de ruta para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub id: Uuid,
    pub name: String,
    pub start_location: String,
    pub end_location: String,
    pub distance: Decimal,
    pub price_per_passenger: Decimal,
    pub is_active: bool,
    pub queue_count: i64,
    pub driver_count: i64,
    pub trip_count: i64,
    pub total_revenue: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Estadísticas agregadas de una ruta
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteStats {
    pub total_drivers: i64,
    pub total_trips: i64,
    pub total_revenue: Decimal,
}

/// Response de detalle de una ruta
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteDetailResponse {
    pub route: RouteResponse,
    pub assigned_drivers: Vec<crate::models::driver::DriverResponse>,
    pub recent_trips: Vec<crate::models::trip::TripTicketResponse>,
    pub stats: RouteStats,
}

impl From<RouteWithStats> for RouteResponse {
    fn from(route: RouteWithStats) -> Self {
        Self {
            id: route.id,
            name: route.name,
            start_location: route.start_location,
            end_location: route.end_location,
            distance: route.distance,
            price_per_passenger: route.price_per_passenger,
            is_active: route.is_active,
            queue_count: route.queue_count,
            driver_count: route.driver_count,
            trip_count: route.trip_count,
            total_revenue: route.total_revenue.unwrap_or(Decimal::ZERO),
            created_at: route.created_at,
            updated_at: route.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateRouteRequest {
        CreateRouteRequest {
            name: "Manila → Baguio".to_string(),
            start_location: "Manila".to_string(),
            end_location: "Baguio".to_string(),
            distance: Decimal::from(250),
            price_per_passenger: Decimal::from(450),
            is_active: true,
        }
    }

    #[test]
    fn test_create_route_request_valid() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_create_route_rejects_negative_price() {
        let mut request = valid_request();
        request.price_per_passenger = Decimal::from(-450);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_route_rejects_negative_distance() {
        let mut request = valid_request();
        request.distance = Decimal::from(-1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_route_rejects_short_name() {
        let mut request = valid_request();
        request.name = "M".to_string();
        assert!(request.validate().is_err());
    }
}
