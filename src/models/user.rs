//! Modelo de User
//!
//! Este módulo contiene el struct User, los roles del sistema
//! y los DTOs de autenticación.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Rol del usuario - determina a qué dashboard se enruta una sesión
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Driver,
    Cashier,
    Ministry,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Driver => "driver",
            UserRole::Cashier => "cashier",
            UserRole::Ministry => "ministry",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(UserRole::Admin),
            "driver" => Some(UserRole::Driver),
            "cashier" => Some(UserRole::Cashier),
            "ministry" => Some(UserRole::Ministry),
            _ => None,
        }
    }
}

/// User - mapea exactamente a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request de login
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(length(min = 6, max = 100))]
    pub password: String,
}

/// Request de registro
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(length(min = 2, max = 100))]
    pub full_name: String,

    #[validate(length(min = 6, max = 100))]
    pub password: String,

    pub role: UserRole,
}

/// Request para refresh token
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 10))]
    pub refresh: String,
}

/// Response de refresh token
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub access: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request para cambio de contraseña
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, max = 100))]
    pub current_password: String,

    #[validate(length(min = 6, max = 100))]
    pub new_password: String,
}

/// Response de usuario para la API (sin password_hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Response de login/registro exitoso
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [UserRole::Admin, UserRole::Driver, UserRole::Cashier, UserRole::Ministry] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("dispatcher"), None);
    }

    #[test]
    fn test_login_request_validation() {
        let valid = LoginRequest {
            username: "cashier1".to_string(),
            password: "secret123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = LoginRequest {
            username: "ab".to_string(),
            password: "1".to_string(),
        };
        assert!(invalid.validate().is_err());
    }
}
