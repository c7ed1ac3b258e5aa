//! Handlers de Vehicles
//!
//! Este módulo maneja las operaciones CRUD para vehículos.
//! La matrícula es única en toda la terminal.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::auth::{require_admin, AuthenticatedUser},
    models::vehicle::{
        CreateVehicleRequest, UpdateVehicleRequest, Vehicle, VehicleFilters, VehicleResponse,
    },
    state::AppState,
    utils::errors::{conflict_error, not_found_error, AppError, AppResult},
};

const VEHICLE_COLUMNS: &str = r#"
    id, plate, vehicle_type, model, year, color, capacity, vehicle_status,
    driver_id, registration_expiry, insurance_expiry, created_at, updated_at
"#;

/// Obtener todos los vehículos con filtros
pub async fn get_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let limit = filters.limit.unwrap_or(50).min(100);
    let offset = filters.offset.unwrap_or(0);

    let query = format!(
        r#"
        SELECT {VEHICLE_COLUMNS}
        FROM vehicles
        WHERE ($1::text IS NULL OR vehicle_status = $1)
          AND ($2::text IS NULL OR vehicle_type = $2)
          AND ($3::uuid IS NULL OR driver_id = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#
    );

    let vehicles = sqlx::query_as::<_, Vehicle>(&query)
        .bind(filters.status)
        .bind(filters.vehicle_type)
        .bind(filters.driver_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

/// Obtener un vehículo por ID
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VehicleResponse>> {
    let query = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");
    let vehicle = sqlx::query_as::<_, Vehicle>(&query)
        .bind(id)
        .fetch_optional(&state.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

    Ok(Json(VehicleResponse::from(vehicle)))
}

/// Crear un nuevo vehículo (estado inicial: active)
pub async fn create_vehicle(
    State(state): State<AppState>,
    Json(vehicle_data): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<VehicleResponse>)> {
    vehicle_data.validate().map_err(AppError::Validation)?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM vehicles WHERE plate = $1")
        .bind(&vehicle_data.plate)
        .fetch_one(&state.pool)
        .await
        .map_err(AppError::Database)?;
    if existing > 0 {
        return Err(conflict_error("Vehicle", "plate", &vehicle_data.plate));
    }

    let query = format!(
        r#"
        INSERT INTO vehicles (id, plate, vehicle_type, model, year, color, capacity,
                              vehicle_status, driver_id, registration_expiry,
                              insurance_expiry, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, 'active', $7, $8, $9, NOW(), NOW())
        RETURNING {VEHICLE_COLUMNS}
        "#
    );

    let vehicle = sqlx::query_as::<_, Vehicle>(&query)
        .bind(&vehicle_data.plate)
        .bind(&vehicle_data.vehicle_type)
        .bind(&vehicle_data.model)
        .bind(vehicle_data.year)
        .bind(&vehicle_data.color)
        .bind(vehicle_data.capacity)
        .bind(vehicle_data.driver_id)
        .bind(vehicle_data.registration_expiry)
        .bind(vehicle_data.insurance_expiry)
        .fetch_one(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok((StatusCode::CREATED, Json(VehicleResponse::from(vehicle))))
}

/// Actualizar un vehículo (reemplazo completo del recurso)
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(vehicle_data): Json<UpdateVehicleRequest>,
) -> AppResult<Json<VehicleResponse>> {
    vehicle_data.validate().map_err(AppError::Validation)?;

    // La matrícula sigue siendo única tras el update
    let plate_taken = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM vehicles WHERE plate = $1 AND id <> $2",
    )
    .bind(&vehicle_data.plate)
    .bind(id)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::Database)?;
    if plate_taken > 0 {
        return Err(conflict_error("Vehicle", "plate", &vehicle_data.plate));
    }

    let query = format!(
        r#"
        UPDATE vehicles SET
            plate = $2, vehicle_type = $3, model = $4, year = $5, color = $6,
            capacity = $7, vehicle_status = $8, driver_id = $9,
            registration_expiry = $10, insurance_expiry = $11, updated_at = NOW()
        WHERE id = $1
        RETURNING {VEHICLE_COLUMNS}
        "#
    );

    let vehicle = sqlx::query_as::<_, Vehicle>(&query)
        .bind(id)
        .bind(&vehicle_data.plate)
        .bind(&vehicle_data.vehicle_type)
        .bind(&vehicle_data.model)
        .bind(vehicle_data.year)
        .bind(&vehicle_data.color)
        .bind(vehicle_data.capacity)
        .bind(vehicle_data.vehicle_status.as_str())
        .bind(vehicle_data.driver_id)
        .bind(vehicle_data.registration_expiry)
        .bind(vehicle_data.insurance_expiry)
        .fetch_optional(&state.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

    Ok(Json(VehicleResponse::from(vehicle)))
}

/// Eliminar un vehículo. Se rechaza mientras tenga una entrada de cola
/// no terminal.
pub async fn delete_vehicle(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;

    let queued = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM queue_entries WHERE vehicle_id = $1 AND queue_status <> 'completed'",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::Database)?;

    if queued > 0 {
        return Err(AppError::Conflict(
            "Vehicle is queued on a route; remove the queue entry before deleting".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(AppError::Database)?;

    if result.rows_affected() == 0 {
        return Err(not_found_error("Vehicle", &id.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
