//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum, incluido el almacén de refresh tokens.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;

/// Refresh token emitido en login/registro, revocable en logout
#[derive(Clone, Debug)]
pub struct RefreshToken {
    pub user_id: Uuid,
    pub role: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl RefreshToken {
    pub fn new(user_id: Uuid, role: String, expires_in_seconds: u64) -> Self {
        Self {
            user_id,
            role,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in_seconds as i64),
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() > self.expires_at
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub refresh_tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        Self {
            pool,
            config,
            refresh_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Emitir y almacenar un refresh token nuevo
    pub async fn issue_refresh_token(&self, user_id: Uuid, role: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let refresh = RefreshToken::new(user_id, role.to_string(), self.config.refresh_expiration);

        let mut tokens = self.refresh_tokens.write().await;
        tokens.insert(token.clone(), refresh);
        tracing::debug!("💾 Refresh token emitido para usuario {}", user_id);

        token
    }

    /// Validar un refresh token almacenado; los expirados se descartan
    pub async fn validate_refresh_token(&self, token: &str) -> Option<RefreshToken> {
        let mut tokens = self.refresh_tokens.write().await;
        match tokens.get(token) {
            Some(refresh) if refresh.is_expired() => {
                tokens.remove(token);
                None
            }
            Some(refresh) => Some(refresh.clone()),
            None => None,
        }
    }

    /// Revocar todos los refresh tokens de un usuario (logout)
    pub async fn revoke_refresh_tokens(&self, user_id: Uuid) {
        let mut tokens = self.refresh_tokens.write().await;
        tokens.retain(|_, refresh| refresh.user_id != user_id);
    }

    /// Limpiar tokens expirados
    pub async fn cleanup_expired_tokens(&self) {
        let mut tokens = self.refresh_tokens.write().await;
        tokens.retain(|_, refresh| !refresh.is_expired());
    }
}
