//! Handlers de Trip Tickets
//!
//! Este módulo maneja el listado y consulta de tickets, y la emisión
//! directa desde caja (flujo de cobro sin pasar por la cola). La tarifa
//! siempre se congela con el precio vigente de la ruta en la emisión.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::auth::{require_admin, AuthenticatedUser},
    models::trip::{IssueTicketRequest, TripFilters, TripTicket, TripTicketResponse},
    services::fare,
    state::AppState,
    utils::errors::{not_found_error, AppError, AppResult},
};

const TICKET_COLUMNS: &str = r#"
    id, ticket_number, route_id, driver_id, vehicle_id, queue_entry_id,
    route_name, driver_name, vehicle_plate, passenger_count,
    fare_per_passenger, total_fare, payment_method, trip_status,
    issued_at, completed_at
"#;

/// Obtener todos los tickets con filtros
pub async fn get_trips(
    State(state): State<AppState>,
    Query(filters): Query<TripFilters>,
) -> AppResult<Json<Vec<TripTicketResponse>>> {
    let limit = filters.limit.unwrap_or(50).min(100);
    let offset = filters.offset.unwrap_or(0);

    let query = format!(
        r#"
        SELECT {TICKET_COLUMNS}
        FROM trip_tickets
        WHERE ($1::uuid IS NULL OR route_id = $1)
          AND ($2::uuid IS NULL OR driver_id = $2)
          AND ($3::uuid IS NULL OR vehicle_id = $3)
          AND ($4::text IS NULL OR trip_status = $4)
          AND ($5::date IS NULL OR issued_at::date >= $5)
          AND ($6::date IS NULL OR issued_at::date <= $6)
        ORDER BY issued_at DESC
        LIMIT $7 OFFSET $8
        "#
    );

    let tickets = sqlx::query_as::<_, TripTicket>(&query)
        .bind(filters.route_id)
        .bind(filters.driver_id)
        .bind(filters.vehicle_id)
        .bind(filters.status)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(tickets.into_iter().map(TripTicketResponse::from).collect()))
}

/// Obtener un ticket por ID
pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TripTicketResponse>> {
    let query = format!("SELECT {TICKET_COLUMNS} FROM trip_tickets WHERE id = $1");
    let ticket = sqlx::query_as::<_, TripTicket>(&query)
        .bind(id)
        .fetch_optional(&state.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Trip ticket", &id.to_string()))?;

    Ok(Json(TripTicketResponse::from(ticket)))
}

/// Emitir un ticket directo desde caja, sin entrada de cola asociada
pub async fn issue_ticket(
    State(state): State<AppState>,
    Json(issue_data): Json<IssueTicketRequest>,
) -> AppResult<(StatusCode, Json<TripTicketResponse>)> {
    issue_data.validate().map_err(AppError::Validation)?;

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let (route_name, fare_per_passenger) = sqlx::query_as::<_, (String, rust_decimal::Decimal)>(
        "SELECT name, price_per_passenger FROM routes WHERE id = $1",
    )
    .bind(issue_data.route_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| not_found_error("Route", &issue_data.route_id.to_string()))?;

    let driver_name = sqlx::query_scalar::<_, String>("SELECT name FROM drivers WHERE id = $1")
        .bind(issue_data.driver_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Driver", &issue_data.driver_id.to_string()))?;

    let vehicle_plate = sqlx::query_scalar::<_, String>("SELECT plate FROM vehicles WHERE id = $1")
        .bind(issue_data.vehicle_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Vehicle", &issue_data.vehicle_id.to_string()))?;

    let total_fare = fare::compute_total_fare(issue_data.passenger_count, fare_per_passenger);
    let ticket_number = fare::generate_ticket_number();

    let query = format!(
        r#"
        INSERT INTO trip_tickets (id, ticket_number, route_id, driver_id, vehicle_id,
                                  queue_entry_id, route_name, driver_name, vehicle_plate,
                                  passenger_count, fare_per_passenger, total_fare,
                                  payment_method, trip_status, issued_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, NULL, $5, $6, $7, $8, $9, $10, $11, 'issued', NOW())
        RETURNING {TICKET_COLUMNS}
        "#
    );

    let ticket = sqlx::query_as::<_, TripTicket>(&query)
        .bind(&ticket_number)
        .bind(issue_data.route_id)
        .bind(issue_data.driver_id)
        .bind(issue_data.vehicle_id)
        .bind(&route_name)
        .bind(&driver_name)
        .bind(&vehicle_plate)
        .bind(issue_data.passenger_count)
        .bind(fare_per_passenger)
        .bind(total_fare)
        .bind(issue_data.payment_method.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!("🎫 Ticket {} emitido desde caja: ₱{}", ticket_number, total_fare);

    Ok((StatusCode::CREATED, Json(TripTicketResponse::from(ticket))))
}

/// Eliminar un ticket (solo admin)
pub async fn delete_trip(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;

    let result = sqlx::query("DELETE FROM trip_tickets WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(AppError::Database)?;

    if result.rows_affected() == 0 {
        return Err(not_found_error("Trip ticket", &id.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
