//! Tests de integración del cliente HTTP: manejo de sesión y
//! serialización de filtros, sin depender de un servidor levantado.

use uuid::Uuid;

use station_management::client::{SessionStore, StationClient};
use station_management::models::driver::DriverFilters;
use station_management::models::queue::QueueFilters;
use station_management::models::trip::TripFilters;

#[test]
fn session_survives_token_refresh() {
    let store = SessionStore::new();
    store.init("old-access".to_string(), "refresh".to_string(), None);

    // El refresh reemplaza solo el access, el refresh token se conserva
    store.update_access("new-access".to_string());
    assert_eq!(store.access_token().as_deref(), Some("new-access"));
    assert_eq!(store.refresh_token().as_deref(), Some("refresh"));
    assert!(store.is_authenticated());
}

#[test]
fn logout_clears_everything() {
    let store = SessionStore::new();
    store.init("access".to_string(), "refresh".to_string(), None);
    store.clear();

    assert!(!store.is_authenticated());
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
    assert!(store.current_user().is_none());
}

#[test]
fn session_is_shared_between_client_clones() {
    let client = StationClient::new("http://localhost:8000/api".to_string()).unwrap();
    let clone = client.clone();

    client
        .session
        .init("shared".to_string(), "refresh".to_string(), None);
    assert_eq!(clone.session.access_token().as_deref(), Some("shared"));

    clone.session.clear();
    assert!(!client.session.is_authenticated());
}

#[test]
fn empty_filters_serialize_to_no_params() {
    // serde skip_serializing_if evita mandar ?status=&route_id= vacíos
    let filters = QueueFilters::default();
    let value = serde_json::to_value(&filters).unwrap();
    assert_eq!(value, serde_json::json!({}));

    let filters = TripFilters::default();
    let value = serde_json::to_value(&filters).unwrap();
    assert_eq!(value, serde_json::json!({}));
}

#[test]
fn populated_filters_serialize_only_set_fields() {
    let route_id = Uuid::new_v4();
    let filters = QueueFilters {
        route_id: Some(route_id),
        status: None,
    };
    let value = serde_json::to_value(&filters).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 1);
    assert_eq!(object["route_id"], serde_json::json!(route_id.to_string()));
}

#[test]
fn driver_filters_keep_pagination_params() {
    let filters = DriverFilters {
        status: Some("active".to_string()),
        vehicle_id: None,
        limit: Some(20),
        offset: Some(40),
    };
    let value = serde_json::to_value(&filters).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 3);
    assert_eq!(object["status"], "active");
    assert_eq!(object["limit"], 20);
    assert_eq!(object["offset"], 40);
}

#[tokio::test]
async fn logout_is_best_effort_when_server_is_unreachable() {
    // Puerto de descarte en loopback: la conexión se rechaza al instante
    let client = StationClient::new("http://127.0.0.1:9/api".to_string()).unwrap();
    client
        .session
        .init("access".to_string(), "refresh".to_string(), None);

    // El fallo al notificar al servidor no es fatal y la sesión local muere
    assert!(client.logout().await.is_ok());
    assert!(!client.session.is_authenticated());
}

#[test]
fn trip_filters_for_route_history_serialize_as_query_params() {
    let driver_id = Uuid::new_v4();
    let filters = TripFilters {
        driver_id: Some(driver_id),
        status: Some("issued".to_string()),
        limit: Some(10),
        ..TripFilters::default()
    };
    let value = serde_json::to_value(&filters).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 3);
    assert_eq!(object["driver_id"], serde_json::json!(driver_id.to_string()));
    assert_eq!(object["status"], "issued");
    assert_eq!(object["limit"], 10);
}
