//! API endpoints
//!
//! Este módulo contiene los endpoints de la API.

pub mod auth;
pub mod drivers;
pub mod queue;
pub mod routes;
pub mod trips;
pub mod vehicles;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

/// Crear el router principal de la API
pub fn create_api_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/login/", post(auth::login))
        .route("/auth/register/", post(auth::register))
        .route("/auth/token/refresh/", post(auth::refresh_token));

    let protected = Router::new()
        .route("/auth/logout/", post(auth::logout))
        .route("/auth/profile/", get(auth::get_profile))
        .route("/auth/change-password/", post(auth::change_password))
        // Rutas
        .route("/routes/", get(routes::get_routes).post(routes::create_route))
        .route(
            "/routes/:id/",
            put(routes::update_route).delete(routes::delete_route),
        )
        .route("/routes/:id/detail/", get(routes::get_route_detail))
        .route("/routes/:id/trips/", get(routes::get_route_trips))
        // Conductores
        .route(
            "/drivers/",
            get(drivers::get_drivers).post(drivers::create_driver),
        )
        .route(
            "/drivers/:id/",
            get(drivers::get_driver)
                .put(drivers::update_driver)
                .delete(drivers::delete_driver),
        )
        // Vehículos
        .route(
            "/vehicles/",
            get(vehicles::get_vehicles).post(vehicles::create_vehicle),
        )
        .route(
            "/vehicles/:id/",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        // Cola de despacho
        .route("/queue/", get(queue::get_queue).post(queue::join_queue))
        .route("/queue/:id/", axum::routing::delete(queue::remove_entry))
        .route("/queue/:id/call/", post(queue::call_entry))
        .route("/queue/:id/depart/", post(queue::depart_entry))
        .route("/queue/:id/complete/", post(queue::complete_entry))
        .route("/queue/:id/delay/", post(queue::delay_entry))
        .route("/queue/:id/resume/", post(queue::resume_entry))
        .route("/queue/:id/move-up/", post(queue::move_up))
        .route("/queue/:id/move-down/", post(queue::move_down))
        // Boletos de viaje
        .route("/trips/", get(trips::get_trips).post(trips::issue_ticket))
        .route(
            "/trips/:id/",
            get(trips::get_trip).delete(trips::delete_trip),
        )
        .route_layer(from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}
