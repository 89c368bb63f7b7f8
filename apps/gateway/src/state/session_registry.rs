// [apps/gateway/src/state/session_registry.rs]
/*!
 * =================================================================
 * APARATO: SESSION REGISTRY (V8.0 - IDEMPOTENT JOIN)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: REGISTRO VIVO DE SESIONES Y ALTAS/BAJAS DE CLIENTES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LAZY SESSIONS: La sesión nace con el primer 'join' que la
 *    referencia y muere cuando el reaper la recoge.
 * 2. IDEMPOTENT JOIN: Un segundo join del mismo (session, user)
 *    reemplaza el handle previo; el anterior se despide con razón.
 * 3. INTERNAL LOCKING: El registro usa su propio RwLock; jamás toca
 *    el cerrojo de simulación de las sesiones.
 * =================================================================
 */

use crate::config::{now_ms, GatewayConfig};
use crate::sim::SimCore;
use crate::state::session::{ClientHandle, SessionRuntime};
use codeblue_domain_budget::{CostGovernor, CostGovernorConfig};
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_models::wire::is_valid_session_id;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Escenario instalado por defecto en sesiones recién nacidas.
const DEFAULT_SCENARIO: ScenarioId = ScenarioId::Syncope;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JoinError {
    /// El identificador no respeta la gramática sellada.
    #[error("invalid_session")]
    InvalidSession,

    /// La sesión exige token y el cliente no lo presentó.
    #[error("auth_required")]
    AuthRequired,

    /// El techo de clientes configurado fue alcanzado.
    #[error("session_full")]
    SessionFull,
}

/// Registro de sesiones vivas del proceso.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionRuntime>>>,
    config: Arc<GatewayConfig>,
}

impl SessionRegistry {
    pub fn new(config: Arc<GatewayConfig>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /**
     * Alta idempotente de un cliente en la sesión.
     * Crea la sesión en el primer join que la referencia; devuelve
     * (runtime, recién_creada) para que el kernel arranque daemons.
     */
    pub fn join(
        &self,
        session_id: &str,
        handle: ClientHandle,
        auth_token: Option<&str>,
    ) -> Result<(Arc<SessionRuntime>, bool), JoinError> {
        if !is_valid_session_id(session_id) {
            return Err(JoinError::InvalidSession);
        }

        // Las sesiones de producción con transporte inseguro exigen token.
        if self.config.is_production && auth_token.map(str::trim).unwrap_or("").is_empty() {
            return Err(JoinError::AuthRequired);
        }

        let (session, newly_created) = self.get_or_create(session_id);

        if session.client_count() >= self.config.session_client_ceiling
            && session.client_role(&handle.user_id).is_none()
        {
            warn!(
                "⛔ [REGISTRY]: Session {} at client ceiling ({}).",
                session_id, self.config.session_client_ceiling
            );
            return Err(JoinError::SessionFull);
        }

        session.attach_client(handle);
        Ok((session, newly_created))
    }

    fn get_or_create(&self, session_id: &str) -> (Arc<SessionRuntime>, bool) {
        if let Some(existing) = self
            .sessions
            .read()
            .expect("Registry lock poisoned")
            .get(session_id)
        {
            return (existing.clone(), false);
        }

        let mut sessions_guard = self.sessions.write().expect("Registry lock poisoned");
        // Doble chequeo: otra conexión pudo crearla entre cerrojos.
        if let Some(existing) = sessions_guard.get(session_id) {
            return (existing.clone(), false);
        }

        let now = now_ms();
        let sim = SimCore::new(session_id, DEFAULT_SCENARIO, now);
        let cost = CostGovernor::new(
            CostGovernorConfig {
                usd_per_token: self.config.usd_per_token,
                soft_limit_usd: self.config.soft_budget_usd,
                hard_limit_usd: self.config.hard_budget_usd,
                on_soft_limit: None,
                on_hard_limit: None,
                on_soft_reset: None,
                chaos_latency_ms: self.config.chaos_latency_ms,
                chaos_drop_percentage: self.config.chaos_drop_percentage,
            }
            .sealed_for_environment(self.config.is_production),
        );

        let session = Arc::new(SessionRuntime::new(session_id.to_string(), sim, cost));
        sessions_guard.insert(session_id.to_string(), session.clone());

        info!("🌱 [REGISTRY]: Session {} born (scenario '{}').", session_id, DEFAULT_SCENARIO.wire_label());
        (session, true)
    }

    /// Baja de un cliente (la sesión sobrevive para el reaper).
    pub fn leave(&self, session_id: &str, user_id: &str, connection_id: u64) {
        if let Some(session) = self.get(session_id) {
            session.detach_client(user_id, connection_id);
        }
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionRuntime>> {
        self.sessions
            .read()
            .expect("Registry lock poisoned")
            .get(session_id)
            .cloned()
    }

    /// Retira y desmantela una sesión (uso exclusivo del reaper).
    pub fn remove(&self, session_id: &str) {
        let removed = self
            .sessions
            .write()
            .expect("Registry lock poisoned")
            .remove(session_id);

        if let Some(session) = removed {
            session.teardown();
            info!("💀 [REGISTRY]: Session {} collected and dismantled.", session_id);
        }
    }

    pub fn all(&self) -> Vec<Arc<SessionRuntime>> {
        self.sessions
            .read()
            .expect("Registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().expect("Registry lock poisoned").len()
    }

    /// Gancho de pruebas: desmantela y vacía todas las sesiones.
    pub fn clear_all(&self) {
        let mut sessions_guard = self.sessions.write().expect("Registry lock poisoned");
        for session in sessions_guard.values() {
            session.teardown();
        }
        sessions_guard.clear();
    }
}
