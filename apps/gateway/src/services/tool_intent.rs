// [apps/gateway/src/services/tool_intent.rs]
/*!
 * =================================================================
 * APARATO: TOOL INTENT PIPELINE (V6.0 - GATE ENFORCED)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: RECEPCIÓN -> ADMISIÓN -> APLICACIÓN DE INTENTS
 *
 * Flujo sellado: todo intent (del LLM o de un control de presentador)
 * se audita como recibido, pasa por el Tool Gate bajo el cerrojo y
 * solo entonces muta el estado. El rechazo notifica únicamente a los
 * presentadores.
 * =================================================================
 */

use crate::config::now_ms;
use crate::sim::run_physiology_pass;
use crate::state::{AppState, SessionRuntime};
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::intents::IntentRequest;
use codeblue_domain_models::wire::OutboundMessage;
use codeblue_domain_policy::GateVerdict;
use std::sync::Arc;
use tracing::{debug, info};

/**
 * Procesa un intent crudo de extremo a extremo.
 * El origen ("realtime" | "presenter") viaja en el rastro de eventos.
 */
pub async fn handle_intent(
    app: &AppState,
    session: &Arc<SessionRuntime>,
    request: IntentRequest,
    origin: &str,
) {
    let now = now_ms();
    let mut events = vec![SimEvent::with_payload(
        now,
        EventKind::IntentReceived,
        serde_json::json!({ "intent": request.intent_type, "origin": origin }),
    )];

    let mut sim = session.sim.lock().await;

    // Allowlist del estadio vigente (None = conjunto universal).
    let stage_allowlist = sim
        .scenario
        .stage(&sim.state.stage_id)
        .and_then(|stage| stage.allowed_intents.clone());

    let verdict = {
        let mut gate = session.gate.lock().expect("Tool gate poisoned");
        gate.validate(stage_allowlist.as_deref(), &request, now)
    };

    match verdict {
        GateVerdict::Rejected { reason } => {
            drop(sim);
            debug!("⛔ [TOOL_GATE]: Intent '{}' rejected: {}.", request.intent_type, reason);
            events.push(SimEvent::with_payload(
                now,
                EventKind::IntentRejected,
                serde_json::json!({ "intent": request.intent_type, "reason": reason }),
            ));
            // El rechazo de política solo se informa a los presentadores.
            session.broadcast_to_presenters(&OutboundMessage::Error {
                message: format!("Intent rejected: {reason}"),
            });
        }
        GateVerdict::Allowed(intent) => {
            events.push(SimEvent::with_payload(
                now,
                EventKind::IntentApproved,
                serde_json::json!({ "intent": intent.wire_label() }),
            ));

            let application = sim.apply_intent(&intent, now);
            events.extend(application.events);

            // Reglas tras el intent exitoso (escenarios complejos).
            let physiology = run_physiology_pass(&mut sim, now);
            events.extend(physiology.events);

            let changed = application.changed || physiology.changed;
            let payload = sim.sim_state_payload();
            let state_snapshot = changed.then(|| sim.get_state());
            let lines = physiology.lines;
            drop(sim);

            info!(
                "🎛️ [TOOL_INTENT]: '{}' applied on session {} (changed={}).",
                intent.wire_label(),
                session.session_id,
                changed
            );

            for (character, line) in lines {
                session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                    session_id: session.session_id.clone(),
                    text: line,
                    character: Some(character),
                });
            }

            if changed {
                session.broadcast(&OutboundMessage::SimState(payload));
                if let Some(state) = state_snapshot {
                    app.persist_state(state);
                }
            }
        }
    }

    app.log_events(&session.session_id, events);
}
