// [apps/gateway/src/routes.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY ROUTE MATRIX (V4.0)
 * CLASIFICACIÓN: API COMPOSITION (ESTRATO L4)
 * RESPONSABILIDAD: MAPA SOBERANO DE RUTAS HTTP/WS DEL GATEWAY
 * =================================================================
 */

use crate::handlers::stream::establish_voice_uplink;
use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Construye el router completo del Gateway.
pub fn build_router(application_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_probe))
        .route("/ws/voice", get(establish_voice_uplink))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(application_state)
}

/// Sonda de vida para balanceadores y monitores externos.
async fn health_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
