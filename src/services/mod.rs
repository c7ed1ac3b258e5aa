//! Servicios de dominio
//!
//! Este módulo contiene la lógica de dominio pura que los handlers
//! invocan antes de tocar la base de datos.

pub mod fare;
pub mod lifecycle;
