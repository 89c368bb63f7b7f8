// [apps/gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (V8.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * # Mathematical Proof (Deterministic Ignition):
 * El proceso garantiza que la observabilidad y la configuración se
 * sellen ANTES de abrir el socket TCP, previniendo estados de carrera
 * donde un cliente se una a un proceso a medio encender.
 * =================================================================
 */

use codeblue_gateway::prelude::*;
use codeblue_shared_sentinel::init_tracing;
use dotenvy::dotenv;
use tracing::info;

/**
 * Punto de ignición supremo del binario del Gateway.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD (SENTINEL)
    init_tracing("codeblue_gateway");

    // 3. CAPTURA SELLADA DE CONFIGURACIÓN
    let configuration = GatewayConfig::from_env();

    // 4. CONSTRUCCIÓN DEL RUNTIME SOBERANO
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        info!("🛰️  [GATEWAY]: Global ignition sequence starting...");

        // 5. KERNEL: ALMACÉN + ESTADO + DAEMONS + SERVIDOR
        let kernel_instance = GatewayKernel::ignite(configuration).await;
        kernel_instance.launch_sovereign_operations().await;
    });

    Ok(())
}
