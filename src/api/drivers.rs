//! Handlers de Drivers
//!
//! Este módulo maneja las operaciones CRUD para conductores.
//! Los cambios de estado (Active/Resting/Suspended) llegan por el
//! update de reemplazo completo y los inicia un administrador.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    middleware::auth::{require_admin, AuthenticatedUser},
    models::driver::{
        CreateDriverRequest, Driver, DriverFilters, DriverResponse, UpdateDriverRequest,
    },
    state::AppState,
    utils::errors::{not_found_error, AppError, AppResult},
};

const DRIVER_COLUMNS: &str = r#"
    id, name, phone, license_number, license_expiry, vehicle_id,
    driver_status, trip_count, created_at, updated_at
"#;

/// Obtener todos los conductores con filtros
pub async fn get_drivers(
    State(state): State<AppState>,
    Query(filters): Query<DriverFilters>,
) -> AppResult<Json<Vec<DriverResponse>>> {
    let limit = filters.limit.unwrap_or(50).min(100);
    let offset = filters.offset.unwrap_or(0);

    let query = format!(
        r#"
        SELECT {DRIVER_COLUMNS}
        FROM drivers
        WHERE ($1::text IS NULL OR driver_status = $1)
          AND ($2::uuid IS NULL OR vehicle_id = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );

    let drivers = sqlx::query_as::<_, Driver>(&query)
        .bind(filters.status)
        .bind(filters.vehicle_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok(Json(drivers.into_iter().map(DriverResponse::from).collect()))
}

/// Obtener un conductor por ID
pub async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DriverResponse>> {
    let query = format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1");
    let driver = sqlx::query_as::<_, Driver>(&query)
        .bind(id)
        .fetch_optional(&state.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;

    Ok(Json(DriverResponse::from(driver)))
}

/// Crear un nuevo conductor (estado inicial: active)
pub async fn create_driver(
    State(state): State<AppState>,
    Json(driver_data): Json<CreateDriverRequest>,
) -> AppResult<(StatusCode, Json<DriverResponse>)> {
    driver_data.validate().map_err(AppError::Validation)?;

    let query = format!(
        r#"
        INSERT INTO drivers (id, name, phone, license_number, license_expiry,
                             vehicle_id, driver_status, trip_count, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, 'active', 0, NOW(), NOW())
        RETURNING {DRIVER_COLUMNS}
        "#
    );

    let driver = sqlx::query_as::<_, Driver>(&query)
        .bind(&driver_data.name)
        .bind(&driver_data.phone)
        .bind(&driver_data.license_number)
        .bind(driver_data.license_expiry)
        .bind(driver_data.vehicle_id)
        .fetch_one(&state.pool)
        .await
        .map_err(AppError::Database)?;

    Ok((StatusCode::CREATED, Json(DriverResponse::from(driver))))
}

/// Actualizar un conductor (reemplazo completo del recurso)
pub async fn update_driver(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(driver_data): Json<UpdateDriverRequest>,
) -> AppResult<Json<DriverResponse>> {
    // El cambio de estado del conductor lo inicia un administrador
    require_admin(&user)?;
    driver_data.validate().map_err(AppError::Validation)?;

    let query = format!(
        r#"
        UPDATE drivers SET
            name = $2, phone = $3, license_number = $4, license_expiry = $5,
            vehicle_id = $6, driver_status = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING {DRIVER_COLUMNS}
        "#
    );

    let driver = sqlx::query_as::<_, Driver>(&query)
        .bind(id)
        .bind(&driver_data.name)
        .bind(&driver_data.phone)
        .bind(&driver_data.license_number)
        .bind(driver_data.license_expiry)
        .bind(driver_data.vehicle_id)
        .bind(driver_data.driver_status.as_str())
        .fetch_optional(&state.pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| not_found_error("Driver", &id.to_string()))?;

    Ok(Json(DriverResponse::from(driver)))
}

/// Eliminar un conductor. Se rechaza mientras tenga una entrada de cola
/// no terminal; los tickets históricos no se tocan.
pub async fn delete_driver(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;

    let queued = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM queue_entries WHERE driver_id = $1 AND queue_status <> 'completed'",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::Database)?;

    if queued > 0 {
        return Err(AppError::Conflict(
            "Driver is queued on a route; remove the queue entry before deleting".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(AppError::Database)?;

    if result.rows_affected() == 0 {
        return Err(not_found_error("Driver", &id.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
