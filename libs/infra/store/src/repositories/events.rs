// [libs/infra/store/src/repositories/events.rs]
/*!
 * =================================================================
 * APARATO: EVENT LEDGER REPOSITORY (V3.2 - APPEND ONLY)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LEDGER APPEND-ONLY DE EVENTOS POR SESIÓN
 *
 * El almacén asigna 'recorded_at' en la inserción; el evento conserva
 * además su 'ts' emitido por el núcleo para el análisis de timeline.
 * =================================================================
 */

use crate::client::StoreClient;
use crate::errors::StoreError;
use codeblue_domain_models::events::SimEvent;
use libsql::params;
use tracing::{debug, instrument};

pub struct EventLedgerRepository {
    store_client: StoreClient,
}

impl EventLedgerRepository {
    pub fn new(store_client: StoreClient) -> Self {
        Self { store_client }
    }

    /// Anexa un evento al ledger de la sesión.
    #[instrument(skip(self, event))]
    pub async fn log_sim_event(&self, sim_id: &str, event: &SimEvent) -> Result<(), StoreError> {
        let connection = self.store_client.get_connection()?;

        let event_type = serde_json::to_value(event.kind)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "error".to_string());

        let payload_json = event
            .payload
            .as_ref()
            .map(|payload| payload.to_string())
            .unwrap_or_else(|| "null".to_string());

        connection
            .execute(
                "INSERT INTO session_events (session_id, ts, event_type, payload_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sim_id, event.ts, event_type.clone(), payload_json],
            )
            .await?;

        debug!("📜 [STORE]: Event '{}' appended for session {}.", event_type, sim_id);
        Ok(())
    }

    /// Conteo de eventos de una sesión (herramientas y certificación).
    pub async fn count_events(&self, sim_id: &str) -> Result<i64, StoreError> {
        let connection = self.store_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT count(*) FROM session_events WHERE session_id = ?1",
                params![sim_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => row.get(0).map_err(|fault| StoreError::MappingError(fault.to_string())),
            None => Ok(0),
        }
    }
}
