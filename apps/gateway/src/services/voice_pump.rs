// [apps/gateway/src/services/voice_pump.rs]
/*!
 * =================================================================
 * APARATO: VOICE EVENT PUMP (V5.0 - FALLBACK GUARDIAN)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: DRENAJE DEL CANAL ÚNICO DE EVENTOS DE VOZ
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HARD-LIMIT GUARD: Ninguna trama 'patient_audio' sale cuando el
 *    límite duro está sellado; la supresión ocurre ANTES de difundir.
 * 2. USAGE -> GOVERNOR: Cada reporte de consumo alimenta al
 *    gobernador; los cruces de umbral emiten eventos budget.* y
 *    fallback.* al ledger.
 * 3. AUTO-CLEAR: La desconexión del proveedor activa fallback que se
 *    limpia solo cuando el enlace se restablece.
 * =================================================================
 */

use crate::config::now_ms;
use crate::services::tool_intent;
use crate::state::{AppState, SessionRuntime};
use codeblue_domain_budget::UsageDelta;
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::wire::OutboundMessage;
use codeblue_infra_voice::{VoiceClient, VoiceClientConfig, VoiceEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/**
 * Intenta la ignición del enlace de voz para una sesión recién nacida.
 * La ausencia de API key deja el núcleo en fallback determinista.
 */
pub async fn ignite_voice_uplink(app: &AppState, session: &Arc<SessionRuntime>) {
    let Some(api_key) = app.config.openai_api_key.clone() else {
        info!(
            "🔇 [VOICE_PUMP]: No API key configured — session {} runs deterministic fallback.",
            session.session_id
        );
        return;
    };

    let connect_result = VoiceClient::connect(VoiceClientConfig {
        api_key,
        model: app.config.realtime_model.clone(),
        endpoint_override: None,
    })
    .await;

    match connect_result {
        Ok((client, event_receiver)) => {
            *session.voice.lock().expect("voice poisoned") = Some(client);
            {
                let mut sim = session.sim.lock().await;
                sim.voice_connected = true;
                sim.state.fallback = false;
            }
            app.log_events(
                &session.session_id,
                vec![SimEvent::new(now_ms(), EventKind::RealtimeConnected)],
            );

            let pump_handle = spawn_voice_pump(app.clone(), session.clone(), event_receiver);
            *session.voice_pump_handle.lock().expect("voice pump poisoned") = Some(pump_handle);
        }
        Err(uplink_fault) => {
            warn!(
                "🔇 [VOICE_PUMP]: Uplink ignition failed for session {}: {} — fallback engaged.",
                session.session_id, uplink_fault
            );
            app.log_events(
                &session.session_id,
                vec![SimEvent::with_payload(
                    now_ms(),
                    EventKind::FallbackEnabled,
                    serde_json::json!({ "reason": "voice_unavailable" }),
                )],
            );
        }
    }
}

/// Drena el canal único de eventos de voz de la sesión.
pub fn spawn_voice_pump(
    app: AppState,
    session: Arc<SessionRuntime>,
    mut event_receiver: mpsc::UnboundedReceiver<VoiceEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(voice_event) = event_receiver.recv().await {
            match voice_event {
                VoiceEvent::AudioOut { audio_base64 } => {
                    // Guardia del límite duro: con fallback sellado no
                    // sale NINGUNA trama de audio sintetizado.
                    let suppressed = {
                        let cost = session.cost.lock().expect("cost poisoned");
                        cost.is_fallback()
                    };
                    if suppressed {
                        continue;
                    }
                    session.broadcast(&OutboundMessage::PatientAudio {
                        session_id: session.session_id.clone(),
                        audio_base64,
                        character: Some("patient".to_string()),
                    });
                }
                VoiceEvent::TranscriptDelta { text, .. } => {
                    session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                        session_id: session.session_id.clone(),
                        text,
                        character: Some("patient".to_string()),
                    });
                }
                VoiceEvent::ToolIntent(request) => {
                    tool_intent::handle_intent(&app, &session, request, "realtime").await;
                }
                VoiceEvent::Usage { input_tokens, output_tokens } => {
                    apply_usage(&app, &session, input_tokens, output_tokens);
                }
                VoiceEvent::Disconnected => {
                    warn!(
                        "🔌 [VOICE_PUMP]: Provider link severed for session {} — fallback until reconnect.",
                        session.session_id
                    );
                    *session.voice.lock().expect("voice poisoned") = None;
                    {
                        let mut sim = session.sim.lock().await;
                        sim.voice_connected = false;
                        sim.state.fallback = true;
                    }
                    app.log_events(
                        &session.session_id,
                        vec![SimEvent::with_payload(
                            now_ms(),
                            EventKind::FallbackEnabled,
                            serde_json::json!({ "reason": "voice_unavailable" }),
                        )],
                    );
                    break;
                }
            }
        }
    })
}

/// Alimenta el gobernador y audita los cruces de umbral.
fn apply_usage(app: &AppState, session: &Arc<SessionRuntime>, input_tokens: u64, output_tokens: u64) {
    let (soft_crossed, hard_crossed) = {
        let mut cost = session.cost.lock().expect("cost poisoned");
        let was_throttled = cost.is_throttled();
        let was_hard = cost.is_hard_limit_hit();

        cost.add_usage(UsageDelta {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
        });

        (
            !was_throttled && cost.is_throttled(),
            !was_hard && cost.is_hard_limit_hit(),
        )
    };

    let now = now_ms();
    let mut events = Vec::new();

    if soft_crossed {
        events.push(SimEvent::new(now, EventKind::BudgetSoft));
    }
    if hard_crossed {
        events.push(SimEvent::new(now, EventKind::BudgetHard));
        events.push(SimEvent::with_payload(
            now,
            EventKind::FallbackEnabled,
            serde_json::json!({ "reason": "budget_hard" }),
        ));
        // Con el límite duro sellado, el enlace upstream se corta.
        if let Some(voice) = session.voice.lock().expect("voice poisoned").take() {
            voice.close();
        }
    }

    app.log_events(&session.session_id, events);
}
