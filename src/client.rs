//! Cliente HTTP para la API de gestión de estación
//!
//! Este módulo contiene el cliente tipado para consumir la API,
//! incluyendo el manejo de la sesión (access + refresh token).

use std::sync::{Arc, RwLock};

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::api::queue::DepartResponse;
use crate::models::driver::{CreateDriverRequest, DriverFilters, DriverResponse, UpdateDriverRequest};
use crate::models::queue::{JoinQueueRequest, QueueEntryResponse, QueueFilters};
use crate::models::route::{
    CreateRouteRequest, RouteDetailResponse, RouteResponse, UpdateRouteRequest,
};
use crate::models::trip::{DepartRequest, IssueTicketRequest, TripFilters, TripTicketResponse};
use crate::models::user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest, UserResponse,
};
use crate::models::vehicle::{
    CreateVehicleRequest, UpdateVehicleRequest, VehicleFilters, VehicleResponse,
};

/// Errores del cliente HTTP
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// La API respondió con un estado de error
    #[error("API error {status}: {message}")]
    Request { status: u16, message: String },

    /// La sesión expiró y el refresh también falló
    #[error("session expired, please login again")]
    SessionExpired,

    /// Error de red o de transporte
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Sesión actual del usuario autenticado
#[derive(Debug, Clone)]
pub struct Session {
    pub access: String,
    pub refresh: String,
    pub user: Option<UserResponse>,
}

/// Almacén de sesión compartido entre clones del cliente
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iniciar una sesión nueva tras el login
    pub fn init(&self, access: String, refresh: String, user: Option<UserResponse>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(Session {
                access,
                refresh,
                user,
            });
        }
    }

    /// Reemplazar solo el access token (tras un refresh exitoso)
    pub fn update_access(&self, access: String) {
        if let Ok(mut guard) = self.inner.write() {
            if let Some(session) = guard.as_mut() {
                session.access = access;
            }
        }
    }

    /// Guardar el perfil del usuario en la sesión
    pub fn set_profile(&self, user: UserResponse) {
        if let Ok(mut guard) = self.inner.write() {
            if let Some(session) = guard.as_mut() {
                session.user = Some(user);
            }
        }
    }

    /// Borrar la sesión (logout o refresh fallido)
    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.access.clone()))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.refresh.clone()))
    }

    pub fn current_user(&self) -> Option<UserResponse> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(|s| s.user.clone()))
    }
}

/// Cliente HTTP tipado para la API de gestión de estación
#[derive(Debug, Clone)]
pub struct StationClient {
    client: Client,
    base_url: String,
    pub session: SessionStore,
}

impl StationClient {
    /// Crear nuevo cliente con la URL base de la API
    pub fn new(base_url: String) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: SessionStore::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(token) = self.session.access_token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Extraer un mensaje legible del body de error de la API
    fn error_message(body: &str) -> String {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            for key in ["message", "error", "detail"] {
                if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                    return text.to_string();
                }
            }
        }
        if body.is_empty() {
            "unknown error".to_string()
        } else {
            body.to_string()
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Request {
                status: status.as_u16(),
                message: Self::error_message(&body),
            });
        }

        Ok(response.json::<T>().await?)
    }

    async fn send_no_content(&self, builder: RequestBuilder) -> ClientResult<()> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Request {
                status: status.as_u16(),
                message: Self::error_message(&body),
            });
        }

        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::POST, path)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send_no_content(self.request(Method::DELETE, path))
            .await
    }

    // ===== Auth =====

    /// Login: guarda access + refresh + usuario en la sesión
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("/auth/login/", &request).await?;
        self.session.init(
            response.access.clone(),
            response.refresh.clone(),
            Some(response.user.clone()),
        );
        Ok(response)
    }

    /// Registro: el servidor devuelve sesión iniciada para el usuario nuevo
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<LoginResponse> {
        let response: LoginResponse = self.post("/auth/register/", request).await?;
        self.session.init(
            response.access.clone(),
            response.refresh.clone(),
            Some(response.user.clone()),
        );
        Ok(response)
    }

    /// Logout: best-effort contra el servidor, la sesión local siempre se borra.
    /// Un fallo al notificar al servidor se registra pero no es fatal.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self
            .send_no_content(self.request(Method::POST, "/auth/logout/"))
            .await;
        self.session.clear();
        if let Err(e) = result {
            tracing::warn!("⚠️ Logout contra el servidor falló: {}", e);
        }
        Ok(())
    }

    /// Refrescar el access token; si falla, la sesión se considera expirada
    pub async fn refresh_session(&self) -> ClientResult<RefreshTokenResponse> {
        let refresh = match self.session.refresh_token() {
            Some(token) => token,
            None => return Err(ClientError::SessionExpired),
        };

        let request = RefreshTokenRequest { refresh };
        match self
            .post::<RefreshTokenResponse, _>("/auth/token/refresh/", &request)
            .await
        {
            Ok(response) => {
                self.session.update_access(response.access.clone());
                Ok(response)
            }
            Err(ClientError::Request { .. }) => {
                self.session.clear();
                Err(ClientError::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }

    /// Obtener el perfil actual y actualizarlo en la sesión
    pub async fn profile(&self) -> ClientResult<UserResponse> {
        let user: UserResponse = self.get("/auth/profile/").await?;
        self.session.set_profile(user.clone());
        Ok(user)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<()> {
        self.send_no_content(
            self.request(Method::POST, "/auth/change-password/")
                .json(request),
        )
        .await
    }

    // ===== Rutas =====

    pub async fn list_routes(&self) -> ClientResult<Vec<RouteResponse>> {
        self.get("/routes/").await
    }

    pub async fn create_route(&self, request: &CreateRouteRequest) -> ClientResult<RouteResponse> {
        self.post("/routes/", request).await
    }

    pub async fn update_route(
        &self,
        id: Uuid,
        request: &UpdateRouteRequest,
    ) -> ClientResult<RouteResponse> {
        self.put(&format!("/routes/{}/", id), request).await
    }

    pub async fn delete_route(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/routes/{}/", id)).await
    }

    pub async fn route_detail(&self, id: Uuid) -> ClientResult<RouteDetailResponse> {
        self.get(&format!("/routes/{}/detail/", id)).await
    }

    pub async fn route_trips(
        &self,
        id: Uuid,
        filters: &TripFilters,
    ) -> ClientResult<Vec<TripTicketResponse>> {
        self.get_with_query(&format!("/routes/{}/trips/", id), filters)
            .await
    }

    // ===== Conductores =====

    pub async fn list_drivers(&self, filters: &DriverFilters) -> ClientResult<Vec<DriverResponse>> {
        self.get_with_query("/drivers/", filters).await
    }

    pub async fn get_driver(&self, id: Uuid) -> ClientResult<DriverResponse> {
        self.get(&format!("/drivers/{}/", id)).await
    }

    pub async fn create_driver(&self, request: &CreateDriverRequest) -> ClientResult<DriverResponse> {
        self.post("/drivers/", request).await
    }

    pub async fn update_driver(
        &self,
        id: Uuid,
        request: &UpdateDriverRequest,
    ) -> ClientResult<DriverResponse> {
        self.put(&format!("/drivers/{}/", id), request).await
    }

    pub async fn delete_driver(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/drivers/{}/", id)).await
    }

    // ===== Vehículos =====

    pub async fn list_vehicles(
        &self,
        filters: &VehicleFilters,
    ) -> ClientResult<Vec<VehicleResponse>> {
        self.get_with_query("/vehicles/", filters).await
    }

    pub async fn get_vehicle(&self, id: Uuid) -> ClientResult<VehicleResponse> {
        self.get(&format!("/vehicles/{}/", id)).await
    }

    pub async fn create_vehicle(
        &self,
        request: &CreateVehicleRequest,
    ) -> ClientResult<VehicleResponse> {
        self.post("/vehicles/", request).await
    }

    pub async fn update_vehicle(
        &self,
        id: Uuid,
        request: &UpdateVehicleRequest,
    ) -> ClientResult<VehicleResponse> {
        self.put(&format!("/vehicles/{}/", id), request).await
    }

    pub async fn delete_vehicle(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/vehicles/{}/", id)).await
    }

    // ===== Cola de despacho =====

    pub async fn list_queue(&self, filters: &QueueFilters) -> ClientResult<Vec<QueueEntryResponse>> {
        self.get_with_query("/queue/", filters).await
    }

    pub async fn join_queue(&self, request: &JoinQueueRequest) -> ClientResult<QueueEntryResponse> {
        self.post("/queue/", request).await
    }

    pub async fn call_entry(&self, id: Uuid) -> ClientResult<QueueEntryResponse> {
        self.post_empty(&format!("/queue/{}/call/", id)).await
    }

    pub async fn depart_entry(
        &self,
        id: Uuid,
        request: &DepartRequest,
    ) -> ClientResult<DepartResponse> {
        self.post(&format!("/queue/{}/depart/", id), request).await
    }

    pub async fn complete_entry(&self, id: Uuid) -> ClientResult<QueueEntryResponse> {
        self.post_empty(&format!("/queue/{}/complete/", id)).await
    }

    pub async fn delay_entry(&self, id: Uuid) -> ClientResult<QueueEntryResponse> {
        self.post_empty(&format!("/queue/{}/delay/", id)).await
    }

    pub async fn resume_entry(&self, id: Uuid) -> ClientResult<QueueEntryResponse> {
        self.post_empty(&format!("/queue/{}/resume/", id)).await
    }

    pub async fn move_entry_up(&self, id: Uuid) -> ClientResult<QueueEntryResponse> {
        self.post_empty(&format!("/queue/{}/move-up/", id)).await
    }

    pub async fn move_entry_down(&self, id: Uuid) -> ClientResult<QueueEntryResponse> {
        self.post_empty(&format!("/queue/{}/move-down/", id)).await
    }

    pub async fn remove_entry(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/queue/{}/", id)).await
    }

    // ===== Boletos =====

    pub async fn list_trips(&self, filters: &TripFilters) -> ClientResult<Vec<TripTicketResponse>> {
        self.get_with_query("/trips/", filters).await
    }

    pub async fn get_trip(&self, id: Uuid) -> ClientResult<TripTicketResponse> {
        self.get(&format!("/trips/{}/", id)).await
    }

    pub async fn issue_ticket(
        &self,
        request: &IssueTicketRequest,
    ) -> ClientResult<TripTicketResponse> {
        self.post("/trips/", request).await
    }

    pub async fn delete_trip(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/trips/{}/", id)).await
    }

    /// Reintentar una petición autenticada tras refrescar el token expirado
    pub async fn with_refresh<T, F, Fut>(&self, operation: F) -> ClientResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        match operation().await {
            Err(ClientError::Request { status, .. }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                self.refresh_session().await?;
                operation().await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_store_lifecycle() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated());
        assert!(store.access_token().is_none());

        store.init("access-1".to_string(), "refresh-1".to_string(), None);
        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));

        store.update_access("access-2".to_string());
        assert_eq!(store.access_token().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));

        store.clear();
        assert!(!store.is_authenticated());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn error_message_prefers_known_keys() {
        assert_eq!(
            StationClient::error_message(r#"{"error":"Not Found","message":"Route not found"}"#),
            "Route not found"
        );
        assert_eq!(
            StationClient::error_message(r#"{"error":"Conflict"}"#),
            "Conflict"
        );
        assert_eq!(
            StationClient::error_message(r#"{"detail":"invalid token"}"#),
            "invalid token"
        );
        assert_eq!(StationClient::error_message("plain text"), "plain text");
        assert_eq!(StationClient::error_message(""), "unknown error");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = StationClient::new("http://localhost:8000/api/".to_string()).unwrap();
        assert_eq!(client.url("/routes/"), "http://localhost:8000/api/routes/");
    }

    #[test]
    fn update_access_without_session_is_noop() {
        let store = SessionStore::new();
        store.update_access("orphan".to_string());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn current_user_follows_profile_updates() {
        let store = SessionStore::new();
        store.init("a".to_string(), "r".to_string(), None);
        assert!(store.current_user().is_none());
    }
}
