//! Modelo de TripTicket
//!
//! Este módulo contiene el ticket de viaje y sus DTOs. El ticket congela
//! la tarifa y la identidad de conductor/vehículo al momento de emisión
//! (snapshot desnormalizado): borrar un conductor no corrompe tickets
//! históricos.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Método de pago del pasaje
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Mobile,
    Qr,
    Ussd,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Mobile => "mobile",
            PaymentMethod::Qr => "qr",
            PaymentMethod::Ussd => "ussd",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(PaymentMethod::Cash),
            "mobile" => Some(PaymentMethod::Mobile),
            "qr" => Some(PaymentMethod::Qr),
            "ussd" => Some(PaymentMethod::Ussd),
            _ => None,
        }
    }
}

/// Estado del ticket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Issued,
    Completed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Issued => "issued",
            TripStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "issued" => Some(TripStatus::Issued),
            "completed" => Some(TripStatus::Completed),
            _ => None,
        }
    }
}

/// TripTicket - mapea exactamente a la tabla trip_tickets
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripTicket {
    pub id: Uuid,
    pub ticket_number: String,
    /// Referencias a las filas vivas; se vuelven NULL si la fuente se borra
    pub route_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    /// Entrada de cola que originó el ticket (NULL en emisión directa de caja)
    pub queue_entry_id: Option<Uuid>,
    // Snapshot desnormalizado tomado en la emisión
    pub route_name: String,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub passenger_count: i32,
    pub fare_per_passenger: Decimal,
    pub total_fare: Decimal,
    pub payment_method: String,
    pub trip_status: String,
    pub issued_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request de despacho: emite el ticket al pasar Called → OnTrip
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DepartRequest {
    #[validate(range(min = 1, max = 100))]
    pub passenger_count: i32,

    pub payment_method: PaymentMethod,
}

/// Request para emitir un ticket directo desde caja (flujo de cobro)
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct IssueTicketRequest {
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,

    #[validate(range(min = 1, max = 100))]
    pub passenger_count: i32,

    pub payment_method: PaymentMethod,
}

/// Response de ticket para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripTicketResponse {
    pub id: Uuid,
    pub ticket_number: String,
    pub route_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub queue_entry_id: Option<Uuid>,
    pub route_name: String,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub passenger_count: i32,
    pub fare_per_passenger: Decimal,
    pub total_fare: Decimal,
    pub payment_method: String,
    pub trip_status: String,
    pub issued_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Filtros para búsqueda de tickets
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TripFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl From<TripTicket> for TripTicketResponse {
    fn from(ticket: TripTicket) -> Self {
        Self {
            id: ticket.id,
            ticket_number: ticket.ticket_number,
            route_id: ticket.route_id,
            driver_id: ticket.driver_id,
            vehicle_id: ticket.vehicle_id,
            queue_entry_id: ticket.queue_entry_id,
            route_name: ticket.route_name,
            driver_name: ticket.driver_name,
            vehicle_plate: ticket.vehicle_plate,
            passenger_count: ticket.passenger_count,
            fare_per_passenger: ticket.fare_per_passenger,
            total_fare: ticket.total_fare,
            payment_method: ticket.payment_method,
            trip_status: ticket.trip_status,
            issued_at: ticket.issued_at,
            completed_at: ticket.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_roundtrip() {
        for method in [PaymentMethod::Cash, PaymentMethod::Mobile, PaymentMethod::Qr, PaymentMethod::Ussd] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }

    #[test]
    fn test_snapshot_survives_source_deletion() {
        // Ticket histórico cuya ruta/conductor/vehículo ya fueron borrados
        let ticket = TripTicket {
            id: Uuid::new_v4(),
            ticket_number: "TKT-A1B2C3D4E5F6".to_string(),
            route_id: None,
            driver_id: None,
            vehicle_id: None,
            queue_entry_id: None,
            route_name: "Terminal Norte - Mercado Central".to_string(),
            driver_name: "Kofi Mensah".to_string(),
            vehicle_plate: "GR-1234-23".to_string(),
            passenger_count: 4,
            fare_per_passenger: Decimal::from(450),
            total_fare: Decimal::from(1800),
            payment_method: "cash".to_string(),
            trip_status: "completed".to_string(),
            issued_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };

        let response = TripTicketResponse::from(ticket);
        assert!(response.route_id.is_none());
        assert!(response.driver_id.is_none());
        assert_eq!(response.route_name, "Terminal Norte - Mercado Central");
        assert_eq!(response.driver_name, "Kofi Mensah");
        assert_eq!(response.total_fare, Decimal::from(1800));
    }

    #[test]
    fn test_depart_request_rejects_zero_passengers() {
        let request = DepartRequest {
            passenger_count: 0,
            payment_method: PaymentMethod::Cash,
        };
        assert!(request.validate().is_err());
    }
}
