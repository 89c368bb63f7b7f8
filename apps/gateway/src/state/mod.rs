// [apps/gateway/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V9.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: PLACA BASE DE ESTRATOS DEL GATEWAY
 *
 * # Mathematical Proof (Fire-and-Forget Persistence):
 * Toda escritura al almacén se despacha FUERA del cerrojo de sesión
 * vía 'tokio::spawn'; un almacén caído degrada a logs y jamás
 * bloquea el latido ni los tratamientos.
 * =================================================================
 */

pub mod session;
pub mod session_registry;

pub use session::{ClientHandle, SessionRuntime};
pub use session_registry::{JoinError, SessionRegistry};

use crate::config::GatewayConfig;
use codeblue_domain_models::events::SimEvent;
use codeblue_domain_models::state::SimulationState;
use codeblue_infra_store::{EventLedgerRepository, SimStateRepository, StoreClient};
use std::sync::Arc;
use tracing::{debug, warn};

/**
 * Contenedor de estado compartido (Thread-Safe) del Gateway.
 */
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub registry: Arc<SessionRegistry>,
    /// Repositorios de persistencia (None = almacén no disponible).
    pub sim_state_repository: Option<Arc<SimStateRepository>>,
    pub event_ledger: Option<Arc<EventLedgerRepository>>,
}

impl AppState {
    /// Forja el estado maestro inyectando todas las dependencias.
    pub fn new(config: Arc<GatewayConfig>, store_client: Option<StoreClient>) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.clone()));

        let (sim_state_repository, event_ledger) = match store_client {
            Some(client) => (
                Some(Arc::new(SimStateRepository::new(client.clone()))),
                Some(Arc::new(EventLedgerRepository::new(client))),
            ),
            None => {
                warn!("🗄️ [APP_STATE]: Store unavailable — running memory-only (events dropped).");
                (None, None)
            }
        };

        Self {
            config,
            registry,
            sim_state_repository,
            event_ledger,
        }
    }

    /**
     * Write-through del snapshot de sesión, fuera del cerrojo.
     * Los fallos se registran y se descartan (jamás se propagan).
     */
    pub fn persist_state(&self, state: SimulationState) {
        let Some(repository) = self.sim_state_repository.clone() else { return };
        let session_id = state.session_id.clone();

        tokio::spawn(async move {
            if let Err(persistence_fault) = repository.persist_sim_state(&session_id, &state).await {
                warn!(
                    "🗄️ [PERSISTENCE]: State write dropped for session {}: {}",
                    session_id, persistence_fault
                );
            }
        });
    }

    /// Anexa eventos al ledger, fuera del cerrojo, best-effort.
    pub fn log_events(&self, session_id: &str, events: Vec<SimEvent>) {
        if events.is_empty() {
            return;
        }
        let Some(ledger) = self.event_ledger.clone() else { return };
        let session_id = session_id.to_string();

        tokio::spawn(async move {
            for event in events {
                if let Err(ledger_fault) = ledger.log_sim_event(&session_id, &event).await {
                    warn!(
                        "📜 [PERSISTENCE]: Event dropped for session {}: {}",
                        session_id, ledger_fault
                    );
                    // Un almacén caído descarta el resto del lote.
                    break;
                }
            }
            debug!("📜 [PERSISTENCE]: Event batch flushed for session {}.", session_id);
        });
    }
}
