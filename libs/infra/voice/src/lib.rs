// [libs/infra/voice/src/lib.rs]
/*!
 * =================================================================
 * APARATO: REALTIME VOICE CLIENT ADAPTER (V4.0 - SINGLE CHANNEL)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ENLACE FULL-DUPLEX CON EL PROVEEDOR REALTIME
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE EVENT CHANNEL: Los cuatro callbacks del diseño original
 *    colapsan en UN canal mpsc de 'VoiceEvent' por sesión; el
 *    manejador drena eventos bajo el cerrojo de la sesión.
 * 2. OPAQUE COLLABORATOR: El Gateway trata este aparato como caja
 *    negra; su ausencia (API key faltante, caída del proveedor) deja
 *    el núcleo funcional en modo fallback determinista.
 * 3. USAGE METERING: Cada 'response.done' upstream emite el consumo
 *    de tokens hacia el gobernador de costos.
 *
 * # Mathematical Proof (Isolation):
 * Ningún fallo del enlace upstream puede propagarse al cerrojo de la
 * sesión: el lector sólo encola eventos y el escritor sólo drena
 * comandos; ambos colapsan en 'Disconnected', jamás en pánico.
 * =================================================================
 */

pub mod client;

pub use client::{VoiceClient, VoiceClientConfig, VoiceError, VoiceEvent};
