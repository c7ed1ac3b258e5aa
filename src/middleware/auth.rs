//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de usuarios autenticados.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    models::user::{User, UserRole},
    state::AppState,
    utils::errors::AppError,
    utils::jwt::{extract_token_from_header, verify_token, JwtConfig},
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;
    let auth_header = extract_token_from_header(auth_header)?;

    // Decodificar y validar JWT
    let jwt_config = JwtConfig::from(&state.config);
    let claims = verify_token(auth_header, &jwt_config)
        .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("ID de usuario inválido".to_string()))?;

    // Verificar que el usuario existe y está activo
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, is_active, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(AppError::Database)?
    .ok_or_else(|| AppError::Unauthorized("Usuario no encontrado".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Usuario inactivo o suspendido".to_string()));
    }

    let role = UserRole::parse(&user.role)
        .ok_or_else(|| AppError::Internal(format!("Rol desconocido: {}", user.role)))?;

    // Inyectar usuario autenticado en las extensions
    let authenticated_user = AuthenticatedUser { user_id: user.id, role };
    request.extensions_mut().insert(authenticated_user);

    Ok(next.run(request).await)
}

/// Verificar permisos de admin dentro de un handler
pub fn require_admin(user: &AuthenticatedUser) -> Result<(), AppError> {
    if user.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Se requieren permisos de administrador".to_string(),
        ));
    }
    Ok(())
}
