//! Handlers de autenticación
//!
//! Este módulo maneja el login, registro, renovación de tokens JWT,
//! perfil y cambio de contraseña.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use validator::Validate;

use crate::{
    middleware::auth::AuthenticatedUser,
    models::user::{
        ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest,
        RefreshTokenResponse, RegisterRequest, User, UserResponse,
    },
    state::AppState,
    utils::errors::{conflict_error, AppError, AppResult},
    utils::jwt::{generate_token, JwtConfig},
};

/// Handler de login
pub async fn login(
    State(state): State<AppState>,
    Json(login_data): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    login_data.validate().map_err(AppError::Validation)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, is_active, created_at, updated_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&login_data.username)
    .fetch_optional(&state.pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Usuario inactivo o suspendido".to_string()));
    }

    let password_valid = verify(&login_data.password, &user.password_hash)
        .map_err(|e| AppError::Hash(e.to_string()))?;
    if !password_valid {
        return Err(AppError::Unauthorized("Credenciales inválidas".to_string()));
    }

    let jwt_config = JwtConfig::from(&state.config);
    let access = generate_token(user.id, &user.role, &jwt_config)?;
    let refresh = state.issue_refresh_token(user.id, &user.role).await;

    tracing::info!("✅ Login exitoso: {} ({})", user.username, user.role);

    Ok(Json(LoginResponse {
        access,
        refresh,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration,
        user: UserResponse::from(user),
    }))
}

/// Handler de registro
pub async fn register(
    State(state): State<AppState>,
    Json(register_data): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    register_data.validate().map_err(AppError::Validation)?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(&register_data.username)
        .fetch_one(&state.pool)
        .await
        .map_err(AppError::Database)?;
    if existing > 0 {
        return Err(conflict_error("User", "username", &register_data.username));
    }

    let password_hash =
        hash(&register_data.password, DEFAULT_COST).map_err(|e| AppError::Hash(e.to_string()))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, full_name, password_hash, role, is_active, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, TRUE, NOW(), NOW())
        RETURNING id, username, full_name, password_hash, role, is_active, created_at, updated_at
        "#,
    )
    .bind(&register_data.username)
    .bind(&register_data.full_name)
    .bind(&password_hash)
    .bind(register_data.role.as_str())
    .fetch_one(&state.pool)
    .await
    .map_err(AppError::Database)?;

    let jwt_config = JwtConfig::from(&state.config);
    let access = generate_token(user.id, &user.role, &jwt_config)?;
    let refresh = state.issue_refresh_token(user.id, &user.role).await;

    tracing::info!("✅ Usuario registrado: {} ({})", user.username, user.role);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            access,
            refresh,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiration,
            user: UserResponse::from(user),
        }),
    ))
}

/// Handler de refresh token: intercambia un refresh token vigente
/// por un access token nuevo
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(refresh_data): Json<RefreshTokenRequest>,
) -> AppResult<Json<RefreshTokenResponse>> {
    refresh_data.validate().map_err(AppError::Validation)?;

    let stored = state
        .validate_refresh_token(&refresh_data.refresh)
        .await
        .ok_or_else(|| AppError::Unauthorized("Refresh token inválido o expirado".to_string()))?;

    let jwt_config = JwtConfig::from(&state.config);
    let access = generate_token(stored.user_id, &stored.role, &jwt_config)?;

    Ok(Json(RefreshTokenResponse {
        access,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiration,
    }))
}

/// Handler de logout: revoca los refresh tokens del usuario
pub async fn logout(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    state.revoke_refresh_tokens(user.user_id).await;
    tracing::info!("👋 Logout de usuario {}", user.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler de perfil del usuario autenticado
pub async fn get_profile(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let profile = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, is_active, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

    Ok(Json(UserResponse::from(profile)))
}

/// Handler de cambio de contraseña: exige la contraseña actual
pub async fn change_password(
    Extension(user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(change_data): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    change_data.validate().map_err(AppError::Validation)?;

    let current = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, is_active, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

    let password_valid = verify(&change_data.current_password, &current.password_hash)
        .map_err(|e| AppError::Hash(e.to_string()))?;
    if !password_valid {
        return Err(AppError::Unauthorized("La contraseña actual no coincide".to_string()));
    }

    let new_hash = hash(&change_data.new_password, DEFAULT_COST)
        .map_err(|e| AppError::Hash(e.to_string()))?;

    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user.user_id)
        .bind(&new_hash)
        .execute(&state.pool)
        .await
        .map_err(AppError::Database)?;

    // Un cambio de contraseña invalida las sesiones abiertas
    state.revoke_refresh_tokens(user.user_id).await;

    Ok(StatusCode::NO_CONTENT)
}
