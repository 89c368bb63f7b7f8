// [libs/infra/store/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STORE ERROR CATALOG (V2.1)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Error de enlace físico o de red con el almacén.
    #[error("[L3_STORE_NET_FAULT]: STORE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (URL vacía, token ausente).
    #[error("[L3_STORE_CONFIG_FAULT]: STORE_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_STORE_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo de transformación entre SQLite y el dominio Rust.
    #[error("[L3_STORE_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),
}
