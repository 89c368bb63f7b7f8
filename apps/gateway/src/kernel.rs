// [apps/gateway/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY KERNEL (V6.0 - IGNITION SEQUENCE)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: SINAPSIS ENTRE ALMACÉN, ESTADO Y SERVIDOR AXUM
 *
 * # Mathematical Proof (Degraded Ignition):
 * La caída del almacén NO impide la ignición: el Gateway arranca en
 * modo memoria (escrituras descartadas con rastro) y las sesiones
 * operan íntegras. La persistencia es mejora, no requisito.
 * =================================================================
 */

use crate::config::GatewayConfig;
use crate::routes::build_router;
use crate::services::reaper::spawn_reaper;
use crate::state::AppState;
use codeblue_infra_store::StoreClient;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct GatewayKernel {
    pub application_shared_state: AppState,
    listen_port: u16,
}

impl GatewayKernel {
    /**
     * Forja el kernel: enlaza el almacén (best-effort) y el estado.
     */
    pub async fn ignite(config: GatewayConfig) -> Self {
        let shared_config = Arc::new(config);

        let store_client = match StoreClient::connect(&shared_config.store).await {
            Ok(client) => Some(client),
            Err(store_fault) => {
                warn!(
                    "🗄️ [KERNEL]: Store ignition failed ({}). Running memory-only.",
                    store_fault
                );
                None
            }
        };

        let listen_port = shared_config.listen_port;
        let application_shared_state = AppState::new(shared_config, store_client);

        Self { application_shared_state, listen_port }
    }

    /**
     * Activa daemons de mantenimiento y levanta el servidor Axum.
     * Bloquea hasta la terminación del proceso.
     */
    pub async fn launch_sovereign_operations(self) {
        // Daemon de higiene de sesiones.
        spawn_reaper(self.application_shared_state.clone());

        let router = build_router(self.application_shared_state);
        let bind_address = format!("0.0.0.0:{}", self.listen_port);

        let listener = match tokio::net::TcpListener::bind(&bind_address).await {
            Ok(listener) => listener,
            Err(bind_fault) => {
                error!("❌ [KERNEL]: Port binding failed on {}: {}", bind_address, bind_fault);
                std::process::exit(1);
            }
        };

        info!("🛰️  [GATEWAY_ONLINE]: Listening on {} (WS at /ws/voice).", bind_address);

        if let Err(serve_fault) = axum::serve(listener, router).await {
            error!("💀 [KERNEL_COLLAPSE]: Server loop terminated: {}", serve_fault);
        }
    }
}
