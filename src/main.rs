use anyhow::Result;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tracing::{error, info};
use dotenvy::dotenv;

use station_management::api;
use station_management::config::environment::EnvironmentConfig;
use station_management::database::DatabaseConnection;
use station_management::middleware::cors::cors_middleware_with_origins;
use station_management::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚌 Station Management - API de rutas y cola de despacho");
    info!("======================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new_default().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let pool = db_connection.pool().clone();
    let cors_origins = config.cors_origins.clone();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let app_state = AppState::new(pool, config);

    // Barrido periódico de refresh tokens expirados
    let cleanup_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            cleanup_state.cleanup_expired_tokens().await;
        }
    });

    let app = Router::new()
        .nest("/api", api::create_api_router(app_state.clone()))
        // Corta requests colgados (pool de DB bajo FOR UPDATE) a los 30s
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|_: BoxError| async {
                    StatusCode::REQUEST_TIMEOUT
                }))
                .layer(TimeoutLayer::new(Duration::from_secs(30))),
        )
        .layer(cors_middleware_with_origins(cors_origins))
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("🔐 Auth:");
    info!("   POST /api/auth/login/ - Iniciar sesión");
    info!("   POST /api/auth/register/ - Registrar usuario");
    info!("   POST /api/auth/token/refresh/ - Refrescar token");
    info!("   POST /api/auth/logout/ - Cerrar sesión");
    info!("   GET  /api/auth/profile/ - Perfil actual");
    info!("   POST /api/auth/change-password/ - Cambiar contraseña");
    info!("🛣️  Rutas:");
    info!("   GET/POST /api/routes/ - Listar/crear rutas");
    info!("   PUT/DELETE /api/routes/:id/ - Actualizar/eliminar ruta");
    info!("   GET  /api/routes/:id/detail/ - Detalle con estadísticas");
    info!("   GET  /api/routes/:id/trips/ - Viajes de la ruta");
    info!("🧑 Conductores: /api/drivers/ y /api/drivers/:id/");
    info!("🚐 Vehículos: /api/vehicles/ y /api/vehicles/:id/");
    info!("📋 Cola de despacho:");
    info!("   GET/POST /api/queue/ - Listar/unirse a la cola");
    info!("   POST /api/queue/:id/call|depart|complete|delay|resume/ - Ciclo de vida");
    info!("   POST /api/queue/:id/move-up|move-down/ - Reordenar");
    info!("   DELETE /api/queue/:id/ - Retirar de la cola");
    info!("🎫 Boletos: /api/trips/ y /api/trips/:id/");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
