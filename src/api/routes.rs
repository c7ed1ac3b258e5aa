//! Handlers de Routes
//!
//! Este módulo maneja las operaciones CRUD para rutas, el detalle con
//! estadísticas agregadas y el listado de viajes por ruta.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::auth::{require_admin, AuthenticatedUser},
    models::driver::{Driver, DriverResponse},
    models::route::{
        CreateRouteRequest, RouteDetailResponse, RouteResponse, RouteStats, RouteWithStats,
        UpdateRouteRequest,
    },
    models::trip::{TripFilters, TripTicket, TripTicketResponse},
    state::AppState,
    utils::errors::{not_found_error, AppError, AppResult},
};

const ROUTE_WITH_STATS: &str = r#"
    SELECT
        r.id, r.name, r.start_location, r.end_location, r.distance,
        r.price_per_passenger, r.is_active, r.created_at, r.updated_at,
        (SELECT COUNT(*) FROM queue_entries q
            WHERE q.route_id = r.id AND q.queue_status <> 'completed') AS queue_count,
        (SELECT COUNT(DISTINCT t.driver_id) FROM trip_tickets t
            WHERE t.route_id = r.id) AS driver_count,
        (SELECT COUNT(*) FROM trip_tickets t
            WHERE t.route_id = r.id) AS trip_count,
        (SELECT SUM(t.total_fare) FROM trip_tickets t
            WHERE t.route_id = r.id) AS total_revenue
    FROM routes r
"#;

/// Obtener todas las rutas con sus contadores derivados
pub async fn get_routes(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RouteResponse>>> {
    let query = format!("{} ORDER BY r.created_at DESC", ROUTE_WITH_STATS);
    let rows = sqlx::query_as::<_, RouteWithStats>(&query)
        .fetch_all(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(rows.into_iter().map(RouteResponse::from).collect()))
}

/// Obtener el detalle de una ruta: conductores asignados, viajes
/// recientes y estadísticas agregadas
pub async fn get_route_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RouteDetailResponse>> {
    let query = format!("{} WHERE r.id = $1", ROUTE_WITH_STATS);
    let route = sqlx::query_as::<_, RouteWithStats>(&query)
        .bind(id)
        .fetch_optional(&state.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Route", &id.to_string()))?;

    let assigned_drivers = sqlx::query_as::<_, Driver>(
        r#"
        SELECT DISTINCT d.id, d.name, d.phone, d.license_number, d.license_expiry,
               d.vehicle_id, d.driver_status, d.trip_count, d.created_at, d.updated_at
        FROM drivers d
        JOIN queue_entries q ON q.driver_id = d.id
        WHERE q.route_id = $1 AND q.queue_status <> 'completed'
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await
    .map_err(AppError::Database)?;

    let recent_trips = sqlx::query_as::<_, TripTicket>(
        r#"
        SELECT id, ticket_number, route_id, driver_id, vehicle_id, queue_entry_id,
               route_name, driver_name, vehicle_plate, passenger_count,
               fare_per_passenger, total_fare, payment_method, trip_status,
               issued_at, completed_at
        FROM trip_tickets
        WHERE route_id = $1
        ORDER BY issued_at DESC
        LIMIT 10
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await
    .map_err(AppError::Database)?;

    let response = RouteResponse::from(route);
    let stats = RouteStats {
        total_drivers: response.driver_count,
        total_trips: response.trip_count,
        total_revenue: response.total_revenue,
    };

    Ok(Json(RouteDetailResponse {
        route: response,
        assigned_drivers: assigned_drivers.into_iter().map(DriverResponse::from).collect(),
        recent_trips: recent_trips.into_iter().map(TripTicketResponse::from).collect(),
        stats,
    }))
}

/// Crear una nueva ruta
pub async fn create_route(
    State(state): State<AppState>,
    Json(route_data): Json<CreateRouteRequest>,
) -> AppResult<(StatusCode, Json<RouteResponse>)> {
    route_data.validate().map_err(AppError::Validation)?;

    let row = sqlx::query_as::<_, RouteWithStats>(
        r#"
        INSERT INTO routes (id, name, start_location, end_location, distance,
                            price_per_passenger, is_active, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING id, name, start_location, end_location, distance,
                  price_per_passenger, is_active, created_at, updated_at,
                  0::bigint AS queue_count, 0::bigint AS driver_count,
                  0::bigint AS trip_count, NULL::numeric AS total_revenue
        "#,
    )
    .bind(&route_data.name)
    .bind(&route_data.start_location)
    .bind(&route_data.end_location)
    .bind(route_data.distance)
    .bind(route_data.price_per_passenger)
    .bind(route_data.is_active)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::Database)?;

    Ok((StatusCode::CREATED, Json(RouteResponse::from(row))))
}

/// Actualizar una ruta (reemplazo completo del recurso)
pub async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(route_data): Json<UpdateRouteRequest>,
) -> AppResult<Json<RouteResponse>> {
    route_data.validate().map_err(AppError::Validation)?;

    let updated = sqlx::query(
        r#"
        UPDATE routes SET
            name = $2, start_location = $3, end_location = $4,
            distance = $5, price_per_passenger = $6, is_active = $7,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&route_data.name)
    .bind(&route_data.start_location)
    .bind(&route_data.end_location)
    .bind(route_data.distance)
    .bind(route_data.price_per_passenger)
    .bind(route_data.is_active)
    .execute(&state.pool)
    .await
    .map_err(AppError::Database)?;

    if updated.rows_affected() == 0 {
        return Err(not_found_error("Route", &id.to_string()));
    }

    let query = format!("{} WHERE r.id = $1", ROUTE_WITH_STATS);
    let row = sqlx::query_as::<_, RouteWithStats>(&query)
        .bind(id)
        .fetch_one(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(RouteResponse::from(row)))
}

/// Eliminar una ruta. Política: se rechaza mientras la ruta tenga
/// entradas de cola; los tickets históricos sobreviven gracias a su
/// snapshot desnormalizado.
pub async fn delete_route(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;

    let queued = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM queue_entries WHERE route_id = $1 AND queue_status <> 'completed'",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::Database)?;

    if queued > 0 {
        return Err(AppError::Conflict(format!(
            "Route has {} active queue entries; clear the queue before deleting",
            queued
        )));
    }

    let result = sqlx::query("DELETE FROM routes WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(AppError::Database)?;

    if result.rows_affected() == 0 {
        return Err(not_found_error("Route", &id.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Listar los viajes de una ruta, con filtros opcionales
pub async fn get_route_trips(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filters): Query<TripFilters>,
) -> AppResult<Json<Vec<TripTicketResponse>>> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM routes WHERE id = $1")
        .bind(id)
        .fetch_one(&state.pool)
        .await
        .map_err(AppError::Database)?;
    if exists == 0 {
        return Err(not_found_error("Route", &id.to_string()));
    }

    let limit = filters.limit.unwrap_or(50).min(100);
    let offset = filters.offset.unwrap_or(0);

    // Filtros omitidos no se aplican: cada condición colapsa a TRUE con NULL
    let trips = sqlx::query_as::<_, TripTicket>(
        r#"
        SELECT id, ticket_number, route_id, driver_id, vehicle_id, queue_entry_id,
               route_name, driver_name, vehicle_plate, passenger_count,
               fare_per_passenger, total_fare, payment_method, trip_status,
               issued_at, completed_at
        FROM trip_tickets
        WHERE route_id = $1
          AND ($2::uuid IS NULL OR driver_id = $2)
          AND ($3::uuid IS NULL OR vehicle_id = $3)
          AND ($4::text IS NULL OR trip_status = $4)
          AND ($5::date IS NULL OR issued_at::date >= $5)
          AND ($6::date IS NULL OR issued_at::date <= $6)
        ORDER BY issued_at DESC
        LIMIT $7 OFFSET $8
        "#,
    )
    .bind(id)
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

    Ok(Json(trips.into_iter().map(TripTicketResponse::from).collect()))
}
