// [libs/infra/store/src/schema.rs]
/*!
 * =================================================================
 * APARATO: STORE SCHEMA BOOTSTRAP (V3.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CRISTALIZACIÓN IDEMPOTENTE DEL ESQUEMA DE SESIONES
 *
 * Disposición persistida: 'sessions/{sim_id}' guarda el último
 * SimState; 'session_events' es la subcolección append-only con
 * sello temporal del núcleo (ts) y del almacén (recorded_at).
 * =================================================================
 */

use crate::errors::StoreError;
use libsql::Connection;
use tracing::debug;

/// DDL idempotente del almacén de sesiones.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sessions (
        session_id   TEXT PRIMARY KEY,
        scenario_id  TEXT NOT NULL,
        state_json   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS session_events (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id   TEXT NOT NULL,
        ts           INTEGER NOT NULL,
        event_type   TEXT NOT NULL,
        payload_json TEXT,
        recorded_at  TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE INDEX IF NOT EXISTS idx_session_events_session
        ON session_events (session_id, ts)",
];

/// Aplica el esquema completo sobre la conexión dada.
pub async fn apply_session_schema(connection: &Connection) -> Result<(), StoreError> {
    for statement in SCHEMA_STATEMENTS {
        connection.execute(statement, ()).await?;
    }
    debug!("🗄️ [STORE_SCHEMA]: Session strata crystallized (idempotent).");
    Ok(())
}
