// [apps/gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY LIBRARY ROOT (V8.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE ESTRATOS DEL GATEWAY
 * =================================================================
 */

pub mod config;
pub mod handlers;
pub mod kernel;
pub mod routes;
pub mod services;
pub mod sim;
pub mod state;

pub mod prelude {
    pub use crate::config::{now_ms, GatewayConfig};
    pub use crate::kernel::GatewayKernel;
    pub use crate::state::{AppState, ClientHandle, SessionRegistry, SessionRuntime};
}
