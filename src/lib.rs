//! Backend de gestión de estación: rutas, cola de despacho y boletos de viaje.

pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
