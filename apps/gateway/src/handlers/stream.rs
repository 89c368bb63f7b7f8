// [apps/gateway/src/handlers/stream.rs]
/**
 * =================================================================
 * APARATO: VOICE GATEWAY SOCKET (V12.0 - TRIPLE TASK)
 * CLASIFICACIÓN: API HANDLER (ESTRATO L4)
 * RESPONSABILIDAD: GESTIÓN DE ENLACE FULL-DUPLEX POR CLIENTE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TRIPLE TASK: Downstream (cola FIFO -> socket + keep-alive) y
 *    Upstream (socket -> validador -> dispatcher) con limpieza
 *    determinista vía AbortHandles.
 * 2. PAYLOAD CEILING: Las tramas que exceden el tope configurado se
 *    rechazan con trama de error y cierre del enlace.
 * 3. RECEIVE-ORDER FIDELITY: El upstream despacha secuencialmente;
 *    las tramas de un cliente se procesan en orden de llegada.
 *
 * # Mathematical Proof (Asynchronous Determinism):
 * El canal mpsc interno desacopla la difusión de estado del envío de
 * red: un cliente lento degrada solo su propia cola, jamás el cerrojo
 * de la sesión ni al resto de la sala.
 * =================================================================
 */

use crate::services::dispatcher::{self, ConnectionContext};
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use codeblue_domain_models::wire::{parse_inbound, render_outbound, OutboundMessage, WireError};
use futures::{sink::SinkExt, stream::StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

/// Intervalo de latido físico (Ping-Pong) del enlace: 25 s.
/// Sintonizado para prevenir cierres por inactividad en proxies L7.
const KEEPALIVE_INTERVAL_SECONDS: u64 = 25;

/**
 * Punto de entrada para la negociación del enlace de voz.
 * Realiza la transición de protocolo HTTP a WebSocket (RFC 6455).
 */
pub async fn establish_voice_uplink(
    websocket_upgrade: WebSocketUpgrade,
    State(application_state): State<AppState>,
) -> impl IntoResponse {
    debug!("🔌 [SOCKET_UPGRADE]: Negotiating protocol transition for new client...");
    websocket_upgrade.on_upgrade(move |socket| handle_active_link(socket, application_state))
}

async fn handle_active_link(socket: WebSocket, application_state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (reply_sender, mut reply_receiver) = mpsc::unbounded_channel::<String>();

    info!("⚡ [UPLINK_OPEN]: Client link established.");

    // --- TAREA 1: DOWNSTREAM (Cola FIFO -> Cliente + Keep-Alive) ---
    let mut downstream_task = tokio::spawn(async move {
        let mut keepalive_timer = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECONDS));

        loop {
            tokio::select! {
                _ = keepalive_timer.tick() => {
                    if socket_sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                },
                queued_frame = reply_receiver.recv() => {
                    match queued_frame {
                        Some(frame) => {
                            if socket_sender.send(Message::Text(frame.into())).await.is_err() {
                                warn!("⚠️ [UPLINK_SEVERED]: Client lost downstream strata.");
                                break;
                            }
                        }
                        None => break,
                    }
                },
            }
        }
    });

    // --- TAREA 2: UPSTREAM (Cliente -> Validador -> Dispatcher) ---
    let reply_sender_for_upstream = reply_sender.clone();
    let app_for_upstream = application_state.clone();
    let mut upstream_task = tokio::spawn(async move {
        let mut connection_context: Option<ConnectionContext> = None;
        let payload_ceiling = app_for_upstream.config.max_ws_payload_bytes;

        while let Some(network_read_result) = socket_receiver.next().await {
            match network_read_result {
                Ok(Message::Text(raw_frame)) => {
                    match parse_inbound(raw_frame.as_ref(), payload_ceiling) {
                        Ok(inbound_message) => {
                            // Despacho secuencial: orden de llegada garantizado.
                            if let Some(new_context) = dispatcher::dispatch(
                                &app_for_upstream,
                                connection_context.as_ref(),
                                inbound_message,
                                &reply_sender_for_upstream,
                            )
                            .await
                            {
                                connection_context = Some(new_context);
                            }
                        }
                        Err(WireError::FrameTooLarge { observed_bytes, ceiling_bytes }) => {
                            // Trama sobredimensionada: error y cierre del enlace.
                            let _ = reply_sender_for_upstream.send(render_outbound(
                                &OutboundMessage::Error {
                                    message: format!(
                                        "Frame of {observed_bytes} bytes exceeds the {ceiling_bytes} byte ceiling."
                                    ),
                                },
                            ));
                            warn!("⛔ [UPLINK_FAULT]: Oversized frame rejected — closing link.");
                            break;
                        }
                        Err(validation_fault) => {
                            // Trama inválida: se responde error y se descarta.
                            let _ = reply_sender_for_upstream.send(render_outbound(
                                &OutboundMessage::Error { message: validation_fault.to_string() },
                            ));
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("🔌 [SOCKET_CLOSE]: Termination signal received from remote host.");
                    break;
                }
                Err(physical_layer_fault) => {
                    error!("❌ [UPLINK_FAULT]: Network error: {}", physical_layer_fault);
                    break;
                }
                _ => {} // Binary y Pong se descartan en este estrato.
            }
        }

        connection_context
    });

    // --- LIMPIEZA ATÓMICA: el primer centinela en caer cierra el resto ---
    let disconnect_context = tokio::select! {
        upstream_result = (&mut upstream_task) => {
            downstream_task.abort();
            upstream_result.ok().flatten()
        },
        _ = (&mut downstream_task) => {
            upstream_task.abort();
            None
        },
    };

    // El desconecte NO cancela trabajo en vuelo: las finalizaciones de
    // órdenes siguen su curso por si el equipo se reconecta.
    if let Some(context) = disconnect_context {
        dispatcher::handle_disconnect(&application_state, &context);
    }

    info!("💀 [UPLINK_TERMINATED]: Client link resources released.");
}
