//! Modelo de QueueEntry
//!
//! Este módulo contiene la entrada de cola de una ruta y sus DTOs.
//! Las posiciones dentro de una ruta son 1-based, únicas y contiguas;
//! el servidor es la única autoridad sobre el orden.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Estado de una entrada de cola
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Waiting,
    Called,
    OnTrip,
    Delayed,
    Completed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::Called => "called",
            QueueStatus::OnTrip => "on_trip",
            QueueStatus::Delayed => "delayed",
            QueueStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(QueueStatus::Waiting),
            "called" => Some(QueueStatus::Called),
            "on_trip" => Some(QueueStatus::OnTrip),
            "delayed" => Some(QueueStatus::Delayed),
            "completed" => Some(QueueStatus::Completed),
            _ => None,
        }
    }

    /// Los estados terminales no aceptan ninguna transición
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed)
    }
}

/// QueueEntry - mapea exactamente a la tabla queue_entries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueEntry {
    pub id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub position: i32,
    pub queue_status: String,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fila de cola enriquecida para listados (nombre del conductor y matrícula)
#[derive(Debug, Clone, FromRow)]
pub struct QueueEntryRow {
    pub id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub position: i32,
    pub queue_status: String,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub driver_name: String,
    pub vehicle_plate: String,
}

/// Request para unir un vehículo/conductor a la cola de una ruta
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct JoinQueueRequest {
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
}

/// Response de entrada de cola para la API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntryResponse {
    pub id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub position: i32,
    pub queue_status: String,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filtros para listar la cola
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct QueueFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl From<QueueEntryRow> for QueueEntryResponse {
    fn from(row: QueueEntryRow) -> Self {
        Self {
            id: row.id,
            route_id: row.route_id,
            driver_id: row.driver_id,
            vehicle_id: row.vehicle_id,
            position: row.position,
            queue_status: row.queue_status,
            driver_name: row.driver_name,
            vehicle_plate: row.vehicle_plate,
            joined_at: row.joined_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_status_roundtrip() {
        for status in [
            QueueStatus::Waiting,
            QueueStatus::Called,
            QueueStatus::OnTrip,
            QueueStatus::Delayed,
            QueueStatus::Completed,
        ] {
            assert_eq!(QueueStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QueueStatus::parse("boarding"), None);
    }

    #[test]
    fn test_only_completed_is_terminal() {
        assert!(QueueStatus::Completed.is_terminal());
        assert!(!QueueStatus::Waiting.is_terminal());
        assert!(!QueueStatus::Called.is_terminal());
        assert!(!QueueStatus::OnTrip.is_terminal());
        assert!(!QueueStatus::Delayed.is_terminal());
    }
}
