//! Keep-alive HTTP endpoint.
//!
//! Two read-only routes over the fleet's status view: `/` reports the
//! identity list with per-connection state, `/status` reports process
//! uptime and memory. No writes, no interaction with the fleet beyond
//! introspection.

use std::net::SocketAddr;

use {
    axum::{Router, extract::State, response::Json, routing::get},
    tracing::info,
};

use qren_fleet::FleetStatus;

#[derive(Clone)]
struct AppState {
    fleet: FleetStatus,
}

/// Build the liveness router (shared between production startup and tests).
pub fn build_app(fleet: FleetStatus) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/status", get(status_handler))
        .with_state(AppState { fleet })
}

/// Bind and serve the liveness endpoint until the process exits.
pub async fn serve(bind: &str, port: u16, fleet: FleetStatus) -> anyhow::Result<()> {
    let app = build_app(fleet);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "liveness endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let bots: Vec<_> = state
        .fleet
        .identities()
        .into_iter()
        .map(|(name, connection_state)| {
            serde_json::json!({
                "name": name,
                "state": connection_state.to_string(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "status": "online",
        "message": "Qren bot fleet is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "active": state.fleet.active(),
        "bots": bots,
    }))
}

async fn status_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "system": "Qren Bot Fleet",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.fleet.uptime().as_secs(),
        "memory_bytes": process_memory_bytes(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Resident memory of this process, when the platform reports it.
fn process_memory_bytes() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = sysinfo::System::new();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|p| p.memory())
}
