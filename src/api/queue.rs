//! Handlers de la cola de despacho
//!
//! Este módulo maneja el ciclo de vida completo de la cola: unirse,
//! llamar, despachar (con emisión de ticket), completar, retrasar,
//! reanudar, reordenar y eliminar. Toda mutación de posiciones corre
//! dentro de una transacción con la fila de la ruta bloqueada, de modo
//! que el invariante {1..N} se preserva frente a operaciones
//! concurrentes sobre la misma ruta.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::driver::DriverStatus,
    models::queue::{
        JoinQueueRequest, QueueEntry, QueueEntryResponse, QueueEntryRow, QueueFilters, QueueStatus,
    },
    models::trip::{DepartRequest, TripTicket, TripTicketResponse},
    models::vehicle::VehicleStatus,
    state::AppState,
    services::{fare, lifecycle},
    services::lifecycle::{MoveDirection, QueueAction},
    utils::errors::{not_found_error, AppError, AppResult},
};

const QUEUE_ROW_COLUMNS: &str = r#"
    q.id, q.route_id, q.driver_id, q.vehicle_id, q.position, q.queue_status,
    q.joined_at, q.updated_at, d.name AS driver_name, v.plate AS vehicle_plate
"#;

/// Response de despacho: la entrada ya en viaje y el ticket emitido
#[derive(Debug, Serialize, Deserialize)]
pub struct DepartResponse {
    pub entry: QueueEntryResponse,
    pub ticket: TripTicketResponse,
}

/// Listar la cola, ordenada por posición
pub async fn get_queue(
    State(state): State<AppState>,
    Query(filters): Query<QueueFilters>,
) -> AppResult<Json<Vec<QueueEntryResponse>>> {
    let query = format!(
        r#"
        SELECT {QUEUE_ROW_COLUMNS}
        FROM queue_entries q
        JOIN drivers d ON d.id = q.driver_id
        JOIN vehicles v ON v.id = q.vehicle_id
        WHERE ($1::uuid IS NULL OR q.route_id = $1)
          AND ($2::text IS NULL OR q.queue_status = $2)
        ORDER BY q.route_id, q.position
        "#
    );

    let rows = sqlx::query_as::<_, QueueEntryRow>(&query)
        .bind(filters.route_id)
        .bind(filters.status)
        .fetch_all(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(rows.into_iter().map(QueueEntryResponse::from).collect()))
}

/// Unir un vehículo/conductor a la cola de una ruta.
/// Posición asignada: max(posiciones de la ruta) + 1, serializada por
/// el lock de la fila de la ruta.
pub async fn join_queue(
    State(state): State<AppState>,
    Json(join_data): Json<JoinQueueRequest>,
) -> AppResult<(StatusCode, Json<QueueEntryResponse>)> {
    join_data.validate().map_err(AppError::Validation)?;

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    // Lock de la ruta: serializa joins/removes/moves concurrentes
    let route = sqlx::query_as::<_, (bool,)>(
        "SELECT is_active FROM routes WHERE id = $1 FOR UPDATE",
    )
    .bind(join_data.route_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| not_found_error("Route", &join_data.route_id.to_string()))?;

    if !route.0 {
        return Err(AppError::BadRequest(
            "Route is inactive and does not accept new queue entries".to_string(),
        ));
    }

    let driver_status = sqlx::query_scalar::<_, String>(
        "SELECT driver_status FROM drivers WHERE id = $1",
    )
    .bind(join_data.driver_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| not_found_error("Driver", &join_data.driver_id.to_string()))?;

    if DriverStatus::parse(&driver_status) == Some(DriverStatus::Suspended) {
        return Err(AppError::Forbidden("A suspended driver cannot be queued".to_string()));
    }

    let vehicle_status = sqlx::query_scalar::<_, String>(
        "SELECT vehicle_status FROM vehicles WHERE id = $1",
    )
    .bind(join_data.vehicle_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| not_found_error("Vehicle", &join_data.vehicle_id.to_string()))?;

    if VehicleStatus::parse(&vehicle_status) != Some(VehicleStatus::Active) {
        return Err(AppError::BadRequest(
            "Vehicle is not active and cannot be queued".to_string(),
        ));
    }

    // Un conductor solo ocupa un lugar a la vez
    let already_queued = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM queue_entries WHERE driver_id = $1 AND queue_status <> 'completed'",
    )
    .bind(join_data.driver_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;
    if already_queued > 0 {
        return Err(AppError::Conflict("Driver already has an active queue entry".to_string()));
    }

    let max_position = sqlx::query_scalar::<_, Option<i32>>(
        "SELECT MAX(position) FROM queue_entries WHERE route_id = $1",
    )
    .bind(join_data.route_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    let position = lifecycle::next_position(max_position);

    let entry = sqlx::query_as::<_, QueueEntry>(
        r#"
        INSERT INTO queue_entries (id, route_id, driver_id, vehicle_id, position,
                                   queue_status, joined_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, 'waiting', NOW(), NOW())
        RETURNING id, route_id, driver_id, vehicle_id, position, queue_status,
                  joined_at, updated_at
        "#,
    )
    .bind(join_data.route_id)
    .bind(join_data.driver_id)
    .bind(join_data.vehicle_id)
    .bind(position)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    let response = fetch_entry_row(&mut tx, entry.id).await?;
    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!("🚐 Vehículo en cola: ruta {} posición {}", entry.route_id, position);

    Ok((StatusCode::CREATED, Json(response)))
}

/// El despachador llama al vehículo (Waiting → Called)
pub async fn call_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QueueEntryResponse>> {
    apply_transition(&state, id, QueueAction::Call).await
}

/// El viaje termina (OnTrip → Completed); el ticket asociado se cierra
pub async fn complete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QueueEntryResponse>> {
    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let entry = lock_entry(&mut tx, id).await?;
    let current = parse_status(&entry.queue_status)?;
    let next = lifecycle::transition(current, QueueAction::Complete)?;

    sqlx::query("UPDATE queue_entries SET queue_status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    sqlx::query(
        r#"
        UPDATE trip_tickets
        SET trip_status = 'completed', completed_at = NOW()
        WHERE queue_entry_id = $1 AND trip_status = 'issued'
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    let response = fetch_entry_row(&mut tx, id).await?;
    tx.commit().await.map_err(AppError::Database)?;

    Ok(Json(response))
}

/// Se detecta un retraso (Waiting → Delayed)
pub async fn delay_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QueueEntryResponse>> {
    apply_transition(&state, id, QueueAction::Delay).await
}

/// El retraso se resuelve (Delayed → Waiting)
pub async fn resume_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QueueEntryResponse>> {
    apply_transition(&state, id, QueueAction::Resume).await
}

/// El conductor sale a ruta (Called → OnTrip). El TripTicket se emite
/// exactamente una vez, en la misma transacción, congelando la tarifa
/// con el precio vigente de la ruta.
pub async fn depart_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(depart_data): Json<DepartRequest>,
) -> AppResult<Json<DepartResponse>> {
    depart_data.validate().map_err(AppError::Validation)?;

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let entry = lock_entry(&mut tx, id).await?;
    let current = parse_status(&entry.queue_status)?;
    let next = lifecycle::transition(current, QueueAction::Depart)?;

    // Snapshot: nombre de ruta y precio vigente, identidad de conductor y vehículo
    let (route_name, fare_per_passenger) = sqlx::query_as::<_, (String, rust_decimal::Decimal)>(
        "SELECT name, price_per_passenger FROM routes WHERE id = $1",
    )
    .bind(entry.route_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    let driver_name = sqlx::query_scalar::<_, String>("SELECT name FROM drivers WHERE id = $1")
        .bind(entry.driver_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    let vehicle_plate = sqlx::query_scalar::<_, String>("SELECT plate FROM vehicles WHERE id = $1")
        .bind(entry.vehicle_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    let total_fare = fare::compute_total_fare(depart_data.passenger_count, fare_per_passenger);
    let ticket_number = fare::generate_ticket_number();

    sqlx::query("UPDATE queue_entries SET queue_status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    let ticket = sqlx::query_as::<_, TripTicket>(
        r#"
        INSERT INTO trip_tickets (id, ticket_number, route_id, driver_id, vehicle_id,
                                  queue_entry_id, route_name, driver_name, vehicle_plate,
                                  passenger_count, fare_per_passenger, total_fare,
                                  payment_method, trip_status, issued_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'issued', NOW())
        RETURNING id, ticket_number, route_id, driver_id, vehicle_id, queue_entry_id,
                  route_name, driver_name, vehicle_plate, passenger_count,
                  fare_per_passenger, total_fare, payment_method, trip_status,
                  issued_at, completed_at
        "#,
    )
    .bind(&ticket_number)
    .bind(entry.route_id)
    .bind(entry.driver_id)
    .bind(entry.vehicle_id)
    .bind(id)
    .bind(&route_name)
    .bind(&driver_name)
    .bind(&vehicle_plate)
    .bind(depart_data.passenger_count)
    .bind(fare_per_passenger)
    .bind(total_fare)
    .bind(depart_data.payment_method.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    sqlx::query("UPDATE drivers SET trip_count = trip_count + 1, updated_at = NOW() WHERE id = $1")
        .bind(entry.driver_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    let response = fetch_entry_row(&mut tx, id).await?;
    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!("🎫 Ticket {} emitido: {} × ₱{}", ticket_number, depart_data.passenger_count, fare_per_passenger);

    Ok(Json(DepartResponse {
        entry: response,
        ticket: TripTicketResponse::from(ticket),
    }))
}

/// Subir una entrada una posición (intercambio con la vecina superior)
pub async fn move_up(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QueueEntryResponse>> {
    move_entry(&state, id, MoveDirection::Up).await
}

/// Bajar una entrada una posición (intercambio con la vecina inferior)
pub async fn move_down(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QueueEntryResponse>> {
    move_entry(&state, id, MoveDirection::Down).await
}

/// Eliminar una entrada de la cola (desde cualquier estado, incluso
/// completada) y renumerar lo que estaba detrás, preservando el
/// invariante sin huecos.
pub async fn remove_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let entry = lock_entry(&mut tx, id).await?;
    let current = parse_status(&entry.queue_status)?;
    if !lifecycle::can_remove(current) {
        return Err(AppError::InvalidTransition(format!(
            "Queue entry in state '{}' cannot be removed",
            current.as_str()
        )));
    }

    lock_route(&mut tx, entry.route_id).await?;

    sqlx::query("DELETE FROM queue_entries WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    sqlx::query(
        "UPDATE queue_entries SET position = position - 1 WHERE route_id = $1 AND position > $2",
    )
    .bind(entry.route_id)
    .bind(entry.position)
    .execute(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    tx.commit().await.map_err(AppError::Database)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Transición simple sin efectos laterales (call/delay/resume)
async fn apply_transition(
    state: &AppState,
    id: Uuid,
    action: QueueAction,
) -> AppResult<Json<QueueEntryResponse>> {
    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let entry = lock_entry(&mut tx, id).await?;
    let current = parse_status(&entry.queue_status)?;
    let next = lifecycle::transition(current, action)?;

    sqlx::query("UPDATE queue_entries SET queue_status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    let response = fetch_entry_row(&mut tx, id).await?;
    tx.commit().await.map_err(AppError::Database)?;

    Ok(Json(response))
}

/// Intercambio atómico de posiciones con la entrada adyacente
async fn move_entry(
    state: &AppState,
    id: Uuid,
    direction: MoveDirection,
) -> AppResult<Json<QueueEntryResponse>> {
    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let entry = lock_entry(&mut tx, id).await?;
    lock_route(&mut tx, entry.route_id).await?;

    // Cuenta todas las entradas: las completadas conservan su posición
    // en la línea hasta que el despachador las retira.
    let queue_len = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM queue_entries WHERE route_id = $1",
    )
    .bind(entry.route_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    let target = lifecycle::swap_target(entry.position, direction, queue_len as i32)
        .ok_or_else(|| {
            AppError::BadRequest("Queue entry is already at the edge of the queue".to_string())
        })?;

    let neighbor_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM queue_entries WHERE route_id = $1 AND position = $2",
    )
    .bind(entry.route_id)
    .bind(target)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Database)?;

    sqlx::query("UPDATE queue_entries SET position = $2, updated_at = NOW() WHERE id = $1")
        .bind(neighbor_id)
        .bind(entry.position)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    sqlx::query("UPDATE queue_entries SET position = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(target)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    let response = fetch_entry_row(&mut tx, id).await?;
    tx.commit().await.map_err(AppError::Database)?;

    Ok(Json(response))
}

/// Bloquear la entrada objetivo dentro de la transacción
async fn lock_entry(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<QueueEntry> {
    sqlx::query_as::<_, QueueEntry>(
        r#"
        SELECT id, route_id, driver_id, vehicle_id, position, queue_status,
               joined_at, updated_at
        FROM queue_entries
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| not_found_error("Queue entry", &id.to_string()))
}

/// Bloquear la fila de la ruta: serializa mutaciones de posición
async fn lock_route(tx: &mut Transaction<'_, Postgres>, route_id: Uuid) -> AppResult<()> {
    sqlx::query("SELECT id FROM routes WHERE id = $1 FOR UPDATE")
        .bind(route_id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;
    Ok(())
}

/// Leer la fila enriquecida (nombre de conductor, matrícula) dentro de la tx
async fn fetch_entry_row(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> AppResult<QueueEntryResponse> {
    let query = format!(
        r#"
        SELECT {QUEUE_ROW_COLUMNS}
        FROM queue_entries q
        JOIN drivers d ON d.id = q.driver_id
        JOIN vehicles v ON v.id = q.vehicle_id
        WHERE q.id = $1
        "#
    );

    let row = sqlx::query_as::<_, QueueEntryRow>(&query)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(AppError::Database)?;

    Ok(QueueEntryResponse::from(row))
}

fn parse_status(value: &str) -> AppResult<QueueStatus> {
    QueueStatus::parse(value)
        .ok_or_else(|| AppError::Internal(format!("Estado de cola desconocido: {}", value)))
}
