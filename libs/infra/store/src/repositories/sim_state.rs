// [libs/infra/store/src/repositories/sim_state.rs]
/*!
 * =================================================================
 * APARATO: SIM STATE REPOSITORY (V4.1 - WRITE-THROUGH)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: UPSERT DEL ÚLTIMO ESTADO DE SIMULACIÓN POR SESIÓN
 *
 * # Mathematical Proof (Idempotent Upsert):
 * El upsert por clave primaria garantiza que re-ejecutar la misma
 * escritura (reintentos del relay) deja el almacén en el mismo
 * estado: última escritura gana, sin duplicados.
 * =================================================================
 */

use crate::client::StoreClient;
use crate::errors::StoreError;
use codeblue_domain_models::state::SimulationState;
use libsql::params;
use tracing::{debug, instrument};

pub struct SimStateRepository {
    store_client: StoreClient,
}

impl SimStateRepository {
    pub fn new(store_client: StoreClient) -> Self {
        Self { store_client }
    }

    /**
     * Upsert write-through del snapshot vigente de una sesión.
     *
     * # Performance:
     * Una sola sentencia con ON CONFLICT; latencia local < 2 ms.
     */
    #[instrument(skip(self, state))]
    pub async fn persist_sim_state(
        &self,
        sim_id: &str,
        state: &SimulationState,
    ) -> Result<(), StoreError> {
        let connection = self.store_client.get_connection()?;

        let state_json = serde_json::to_string(state)
            .map_err(|fault| StoreError::MappingError(fault.to_string()))?;

        connection
            .execute(
                "INSERT INTO sessions (session_id, scenario_id, state_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(session_id) DO UPDATE SET
                     scenario_id = excluded.scenario_id,
                     state_json  = excluded.state_json,
                     updated_at  = excluded.updated_at",
                params![
                    sim_id,
                    state.scenario_id.wire_label(),
                    state_json,
                    chrono::Utc::now().to_rfc3339()
                ],
            )
            .await?;

        debug!("🗄️ [STORE]: Sim state crystallized for session {}.", sim_id);
        Ok(())
    }

    /// Recupera el último snapshot persistido, si existe.
    pub async fn fetch_sim_state(&self, sim_id: &str) -> Result<Option<SimulationState>, StoreError> {
        let connection = self.store_client.get_connection()?;

        let mut rows = connection
            .query(
                "SELECT state_json FROM sessions WHERE session_id = ?1",
                params![sim_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let state_json: String = row
                    .get(0)
                    .map_err(|fault| StoreError::MappingError(fault.to_string()))?;
                let state = serde_json::from_str(&state_json)
                    .map_err(|fault| StoreError::MappingError(fault.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }
}
