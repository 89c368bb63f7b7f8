// [apps/gateway/src/services/reaper.rs]
/*!
 * =================================================================
 * APARATO: SESSION REAPER SERVICE (V4.0 - GRACE GUARDED)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: RECOLECCIÓN DE SESIONES HUÉRFANAS
 *
 * Una sesión es recolectable cuando (a) no tiene clientes, (b) no
 * tiene órdenes pendientes y (c) venció la gracia de re-conexión.
 * Un desconecte NO cancela trabajo en vuelo: el equipo puede volver.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

/// Cadencia del barrido de higiene.
const REAPER_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Inicia el servicio de limpieza perpetua en el runtime de Tokio.
pub fn spawn_reaper(app: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut maintenance_ticker = interval(Duration::from_secs(REAPER_SWEEP_INTERVAL_SECONDS));
        info!("💀 [REAPER_ACTIVE]: Session hygiene daemon initiated.");

        loop {
            maintenance_ticker.tick().await;

            let grace_ms = app.config.session_grace_ms;
            let mut collected_count = 0usize;

            for session in app.registry.all() {
                if session.is_collectable(grace_ms).await {
                    app.registry.remove(&session.session_id);
                    collected_count += 1;
                }
            }

            if collected_count > 0 {
                info!(
                    "💀 [REAPER_CLEANUP]: Collected {} orphaned sessions ({} alive).",
                    collected_count,
                    app.registry.session_count()
                );
            }
        }
    })
}
