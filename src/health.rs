//! Liveness endpoint for container platforms that expect an HTTP port.

use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use crate::config::CONFIG;

async fn healthz() -> &'static str {
    "Bot is running!"
}

/// Serve `GET /` and `GET /healthz` in the background. Per-chat failures
/// never touch this endpoint; it only reports process liveness.
pub fn spawn_health_server() {
    tokio::spawn(async move {
        let app = Router::new()
            .route("/", get(healthz))
            .route("/healthz", get(healthz));

        let addr = format!("0.0.0.0:{}", CONFIG.health_port);
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("Failed to bind health server on {addr}: {err}");
                return;
            }
        };

        info!("Health server listening on {addr}");
        if let Err(err) = axum::serve(listener, app).await {
            error!("Health server exited: {err}");
        }
    });
}
