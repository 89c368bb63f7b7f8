// [libs/infra/store/src/client.rs]
/*!
 * =================================================================
 * APARATO: STORE CONNECTION CLIENT (V5.2 - EMULATOR AWARE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES TÁCTICOS AL ALMACÉN DE SESIONES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EMULATOR HOOK: 'SIM_STORE_EMULATOR_HOST' + project id redirigen
 *    el enlace a un segmento de memoria compartido para entornos de
 *    prueba, sin tocar el código de los repositorios.
 * 2. MEMORY ANCHOR: En modo RAM se abre un ancla de conexión ANTES
 *    del bootstrap para que el esquema resida en el segmento
 *    compartido y sea visible entre hilos.
 * =================================================================
 */

use crate::errors::StoreError;
use crate::schema::apply_session_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::info;

/// Coordenadas de conexión del almacén.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// URL del almacén: "file:...", "libsql://..." o memoria compartida.
    pub url: String,
    pub auth_token: Option<String>,
    /// Host del emulador de pruebas (tiene prioridad sobre 'url').
    pub emulator_host: Option<String>,
    /// Identificador de proyecto usado para aislar el emulador.
    pub project_id: Option<String>,
}

impl StoreConfig {
    /// URL efectiva tras aplicar el gancho de emulador.
    fn effective_url(&self) -> String {
        match &self.emulator_host {
            Some(_host) => {
                let namespace = self.project_id.as_deref().unwrap_or("codeblue-sim");
                format!("file:{namespace}-emulator?mode=memory&cache=shared")
            }
            None => self.url.clone(),
        }
    }
}

#[derive(Clone)]
pub struct StoreClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene viva la base en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config.effective_url();
        if url.is_empty() {
            return Err(StoreError::ConfigurationError("SIM_STORE_URL undefined".into()));
        }

        info!("🔌 [STORE]: Initiating tactical link synchronization to [{}]", url);

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = config.auth_token.clone().ok_or_else(|| {
                StoreError::ConfigurationError("Remote store access denied (token missing)".into())
            })?;
            Builder::new_remote(url.clone(), token).build().await
        } else {
            Builder::new_local(&url).build().await
        }
        .map_err(|fault| StoreError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {fault}")))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            // El ancla garantiza que el esquema viva en el segmento compartido.
            let anchor_connection = shared_driver
                .connect()
                .map_err(|fault| StoreError::ConnectionError(format!("ANCHOR_FAULT: {fault}")))?;
            apply_session_schema(&anchor_connection).await?;
            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [STORE]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver
                .connect()
                .map_err(|fault| StoreError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {fault}")))?;
            apply_session_schema(&bootstrap_connection).await?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, StoreError> {
        self.internal_database_driver
            .connect()
            .map_err(|fault| StoreError::ConnectionError(fault.to_string()))
    }
}
