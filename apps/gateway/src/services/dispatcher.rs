// [apps/gateway/src/services/dispatcher.rs]
/*!
 * =================================================================
 * APARATO: INBOUND MESSAGE DISPATCHER (V14.0 - TACTICAL ROUTER)
 * CLASIFICACIÓN: SERVICE LAYER (ESTRATO L4)
 * RESPONSABILIDAD: DEMULTIPLEXACIÓN DE TRAMAS HACIA LOS MANEJADORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RECEIVE-ORDER FIDELITY: Cada conexión procesa sus tramas en
 *    orden de llegada (el lector del socket espera este despacho).
 * 2. COMMAND COOLDOWN: Los mandos de presentador respetan la ventana
 *    'COMMAND_COOLDOWN_MS' por tipo; las órdenes clínicas no.
 * 3. CLARIFICATION LOOP: Texto sin gramática reconocida con una
 *    clarificación pendiente se interpreta como su respuesta.
 * =================================================================
 */

use crate::config::now_ms;
use crate::services::{analysis, heartbeat, order_desk, voice_pump};
use crate::sim::treatments::apply_treatment;
use crate::sim::{run_physiology_pass, PendingClarification, SimCore};
use crate::state::{AppState, ClientHandle, JoinError, SessionRuntime};
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::orders::OrderKind;
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_models::wire::{ClientRole, CommandType, InboundMessage, OutboundMessage, PatientStateKind};
use codeblue_domain_orders::{
    parse_clarification_response, parse_multiple_orders, ParsedOrder, ParsedOrderKind,
};
use codeblue_domain_scenarios::{
    ACTION_ASKED_ABOUT_EXERTION, ACTION_ASKED_FAMILY_HISTORY, ACTION_STAND_TEST,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Generador de identidades de conexión del proceso.
static CONNECTION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Contexto vivo de una conexión ya unida a una sesión.
#[derive(Clone)]
pub struct ConnectionContext {
    pub session: Arc<SessionRuntime>,
    pub session_id: String,
    pub user_id: String,
    pub role: ClientRole,
    pub connection_id: u64,
}

/**
 * Despacha una trama entrante. Devuelve un contexto nuevo cuando un
 * 'join' exitoso vincula la conexión a una sesión.
 */
pub async fn dispatch(
    app: &AppState,
    context: Option<&ConnectionContext>,
    message: InboundMessage,
    reply_sender: &mpsc::UnboundedSender<String>,
) -> Option<ConnectionContext> {
    match message {
        InboundMessage::Join { session_id, user_id, role, display_name, auth_token } => {
            handle_join(app, session_id, user_id, role, display_name, auth_token, reply_sender).await
        }

        InboundMessage::Ping { .. } => {
            send_direct(reply_sender, &OutboundMessage::Pong);
            None
        }

        other_message => {
            let Some(context) = context else {
                send_direct(
                    reply_sender,
                    &OutboundMessage::Error { message: "Join a session before sending messages.".to_string() },
                );
                return None;
            };
            route_session_message(app, context, other_message).await;
            None
        }
    }
}

async fn handle_join(
    app: &AppState,
    session_id: String,
    user_id: String,
    role: ClientRole,
    display_name: Option<String>,
    auth_token: Option<String>,
    reply_sender: &mpsc::UnboundedSender<String>,
) -> Option<ConnectionContext> {
    let connection_id = CONNECTION_SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let handle = ClientHandle {
        user_id: user_id.clone(),
        role,
        display_name,
        character: None,
        connection_id,
        sender: reply_sender.clone(),
    };

    match app.registry.join(&session_id, handle, auth_token.as_deref()) {
        Ok((session, newly_created)) => {
            if newly_created {
                ignite_session_daemons(app, &session).await;
            }

            send_direct(reply_sender, &OutboundMessage::Joined { session_id: session_id.clone(), role });

            // Snapshot inmediato para el recién llegado.
            let payload = {
                let sim = session.sim.lock().await;
                sim.sim_state_payload()
            };
            session.send_to_user(&user_id, &OutboundMessage::SimState(payload));

            session.broadcast(&OutboundMessage::ParticipantState {
                session_id: session_id.clone(),
                user_id: user_id.clone(),
                speaking: false,
                character: None,
            });

            info!("🤝 [DISPATCHER]: User {} joined session {} as {:?}.", user_id, session_id, role);

            Some(ConnectionContext { session, session_id, user_id, role, connection_id })
        }
        Err(join_fault) => {
            let message = match join_fault {
                JoinError::InvalidSession => "invalid_session",
                JoinError::AuthRequired => "auth_required",
                JoinError::SessionFull => "session_full",
            };
            send_direct(reply_sender, &OutboundMessage::Error { message: message.to_string() });
            None
        }
    }
}

/// Arranca los daemons de una sesión recién nacida.
async fn ignite_session_daemons(app: &AppState, session: &Arc<SessionRuntime>) {
    rehydrate_from_store(app, session).await;

    let heartbeat_handle = heartbeat::spawn_heartbeat(app.clone(), session);
    *session.heartbeat_handle.lock().expect("heartbeat poisoned") = Some(heartbeat_handle);
    voice_pump::ignite_voice_uplink(app, session).await;
}

/**
 * Restituye una sesión renacida desde el almacén (re-conexión del
 * equipo tras la recolección del proceso). Un almacén caído degrada
 * en silencio al escenario por defecto.
 */
async fn rehydrate_from_store(app: &AppState, session: &Arc<SessionRuntime>) {
    let Some(repository) = app.sim_state_repository.clone() else { return };

    match repository.fetch_sim_state(&session.session_id).await {
        Ok(Some(stored_state)) => {
            let mut sim = session.sim.lock().await;
            if stored_state.scenario_id != sim.state.scenario_id {
                *sim = SimCore::new(&session.session_id, stored_state.scenario_id, now_ms());
            }
            let stored_orders = stored_state.orders.clone();
            sim.hydrate(codeblue_domain_models::state::StatePatch::from(&stored_state));
            sim.hydrate_orders(stored_orders);
            info!(
                "💧 [DISPATCHER]: Session {} rehydrated from store (stage '{}').",
                session.session_id, sim.state.stage_id
            );
        }
        Ok(None) => {}
        Err(store_fault) => {
            debug!("🗄️ [DISPATCHER]: Rehydration skipped: {}", store_fault);
        }
    }
}

async fn route_session_message(app: &AppState, context: &ConnectionContext, message: InboundMessage) {
    let session = &context.session;

    match message {
        InboundMessage::StartSpeaking { user_id, character, .. } => {
            if is_muted(session, &user_id) {
                return;
            }
            session.broadcast(&OutboundMessage::ParticipantState {
                session_id: context.session_id.clone(),
                user_id,
                speaking: true,
                character,
            });
        }

        InboundMessage::StopSpeaking { user_id, character, .. } => {
            session.broadcast(&OutboundMessage::ParticipantState {
                session_id: context.session_id.clone(),
                user_id,
                speaking: false,
                character,
            });
            // El fin de turno sella el buffer para que el proveedor conteste.
            commit_voice_if_live(session).await;
        }

        InboundMessage::DoctorAudio { user_id, audio_base64, .. } => {
            if is_muted(session, &user_id) {
                return;
            }
            let ai_paused = {
                let sim = session.sim.lock().await;
                sim.ai_paused
            };
            if ai_paused {
                return;
            }
            let voice_guard = session.voice.lock().expect("voice poisoned");
            if let Some(voice) = voice_guard.as_ref() {
                voice.send_audio_chunk(&audio_base64);
            }
        }

        InboundMessage::VoiceCommand { user_id, command_type, payload, .. } => {
            handle_voice_command(app, context, &user_id, command_type, payload).await;
        }

        InboundMessage::SetScenario { scenario_id, .. } => {
            // La gramática ya validó la pertenencia al catálogo.
            if let Some(parsed_id) = ScenarioId::parse(&scenario_id) {
                reset_scenario(app, context, parsed_id).await;
            }
        }

        InboundMessage::AnalyzeTranscript { turns, .. } => {
            let state_snapshot = {
                let sim = session.sim.lock().await;
                sim.get_state()
            };
            let analysis_message = analysis::analyze_session(&state_snapshot, &turns);
            session.broadcast_to_presenters(&analysis_message);
        }

        InboundMessage::Join { .. } | InboundMessage::Ping { .. } => {
            // Manejados en el despacho superior.
        }
    }
}

async fn handle_voice_command(
    app: &AppState,
    context: &ConnectionContext,
    user_id: &str,
    command_type: CommandType,
    payload: Option<serde_json::Value>,
) {
    let session = &context.session;

    // Los mandos de cabina respetan el cooldown; el flujo clínico no.
    let is_clinical_flow = matches!(
        command_type,
        CommandType::Order | CommandType::Exam | CommandType::Treatment
    );
    if !is_clinical_flow && !session.command_admitted(command_type, app.config.command_cooldown_ms) {
        debug!("🧊 [DISPATCHER]: Command {:?} inside cooldown window — dropped.", command_type);
        return;
    }

    match command_type {
        CommandType::PauseAi => {
            {
                let mut sim = session.sim.lock().await;
                sim.ai_paused = true;
            }
            session.broadcast(&OutboundMessage::PatientState {
                session_id: context.session_id.clone(),
                state: PatientStateKind::Idle,
                character: None,
                display_name: None,
            });
        }

        CommandType::ResumeAi => {
            {
                let mut sim = session.sim.lock().await;
                sim.ai_paused = false;
            }
            session.broadcast(&OutboundMessage::PatientState {
                session_id: context.session_id.clone(),
                state: PatientStateKind::Listening,
                character: None,
                display_name: None,
            });
        }

        CommandType::ForceReply => commit_voice_if_live(session).await,

        CommandType::EndTurn => {
            let voice_guard = session.voice.lock().expect("voice poisoned");
            if let Some(voice) = voice_guard.as_ref() {
                voice.cancel_response();
            }
        }

        CommandType::MuteUser => {
            let target_user = payload
                .as_ref()
                .and_then(|value| value["target_user_id"].as_str())
                .unwrap_or(user_id)
                .to_string();
            session
                .muted_users
                .write()
                .expect("muted users poisoned")
                .insert(target_user.clone());
            session.broadcast(&OutboundMessage::ParticipantState {
                session_id: context.session_id.clone(),
                user_id: target_user,
                speaking: false,
                character: None,
            });
        }

        CommandType::Freeze => {
            session.freeze();
            info!("🧊 [DISPATCHER]: Session {} frozen by presenter.", context.session_id);
        }

        CommandType::Unfreeze => {
            session.unfreeze().await;
            info!("🧊 [DISPATCHER]: Session {} resumed.", context.session_id);
        }

        CommandType::SkipStage => skip_to_next_stage(app, context).await,

        CommandType::ToggleTelemetry => {
            let (payload_snapshot, state_snapshot) = {
                let mut sim = session.sim.lock().await;
                let enabled_now = !sim.state.telemetry_enabled;
                sim.set_telemetry(enabled_now, None);
                (sim.sim_state_payload(), sim.get_state())
            };
            session.broadcast(&OutboundMessage::SimState(payload_snapshot));
            app.persist_state(state_snapshot);
        }

        CommandType::ShowEkg => {
            let payload_snapshot = {
                let sim = session.sim.lock().await;
                sim.sim_state_payload()
            };
            session.broadcast(&OutboundMessage::SimState(payload_snapshot));
        }

        CommandType::Order | CommandType::Treatment => {
            let Some(order_text) = payload
                .as_ref()
                .and_then(|value| value["text"].as_str())
                .map(str::to_string)
            else {
                session.send_to_user(
                    user_id,
                    &OutboundMessage::Error { message: "Order command requires a text payload.".to_string() },
                );
                return;
            };
            route_clinical_text(app, context, user_id, &order_text).await;
        }

        CommandType::Exam => {
            handle_exam_command(app, context, user_id, payload).await;
        }
    }
}

/// Mando de examen: área dirigida o acción de historia clínica.
async fn handle_exam_command(
    app: &AppState,
    context: &ConnectionContext,
    user_id: &str,
    payload: Option<serde_json::Value>,
) {
    // Acciones de historia (prueba de pie, esfuerzo, antecedentes).
    if let Some(action) = payload.as_ref().and_then(|value| value["action"].as_str()) {
        let recognized_action = matches!(
            action,
            ACTION_ASKED_ABOUT_EXERTION | ACTION_STAND_TEST | ACTION_ASKED_FAMILY_HISTORY
        );
        if recognized_action {
            let session = &context.session;
            {
                let mut sim = session.sim.lock().await;
                sim.record_action(action);
            }
            debug!("🩺 [DISPATCHER]: History action '{}' recorded.", action);
            return;
        }
    }

    let order_kind = match payload.as_ref().and_then(|value| value["area"].as_str()) {
        Some("cardiac") => OrderKind::CardiacExam,
        Some("lungs") => OrderKind::LungExam,
        Some("vitals") => OrderKind::Vitals,
        _ => OrderKind::GeneralExam,
    };

    order_desk::handle_order(app, &context.session, order_kind, None, Some(user_id.to_string())).await;
}

/**
 * Ruteo del texto clínico libre: parser -> clarificación/órdenes/
 * tratamientos. Un enunciado compuesto se despacha segmento a segmento.
 */
pub async fn route_clinical_text(app: &AppState, context: &ConnectionContext, user_id: &str, text: &str) {
    let session = &context.session;
    let parsed_orders = parse_multiple_orders(text);

    if parsed_orders.is_empty() {
        // ¿Respuesta a una clarificación pendiente?
        let resolved = try_resolve_clarification(session, text).await;
        match resolved {
            Some(ready_order) => execute_parsed_order(app, context, user_id, ready_order).await,
            None => {
                let question = {
                    let sim = session.sim.lock().await;
                    sim.pending_clarification.as_ref().map(|pending| pending.question.clone())
                };
                let line = question.unwrap_or_else(|| {
                    "I didn't catch an order in that — can you say it again?".to_string()
                });
                session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                    session_id: context.session_id.clone(),
                    text: line,
                    character: Some("nurse".to_string()),
                });
            }
        }
        return;
    }

    for parsed in parsed_orders {
        if parsed.needs_clarification {
            let question = parsed
                .clarification_question
                .clone()
                .unwrap_or_else(|| "Can you give me the details on that?".to_string());
            {
                let mut sim = session.sim.lock().await;
                sim.pending_clarification = Some(PendingClarification {
                    kind: parsed.kind,
                    params: parsed.params.clone(),
                    question: question.clone(),
                });
            }
            session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                session_id: context.session_id.clone(),
                text: question,
                character: Some("nurse".to_string()),
            });
            continue;
        }

        execute_parsed_order(app, context, user_id, parsed).await;
    }
}

/// Fusiona la respuesta con la clarificación pendiente, si encaja.
async fn try_resolve_clarification(session: &Arc<SessionRuntime>, text: &str) -> Option<ParsedOrder> {
    let mut sim = session.sim.lock().await;
    let pending = sim.pending_clarification.take()?;

    let update = parse_clarification_response(text, pending.kind);
    let mut merged_params = pending.params.clone();
    merged_params.merge_clarification(update);

    let candidate = ParsedOrder {
        kind: pending.kind,
        confidence: codeblue_domain_orders::Confidence::High,
        params: merged_params,
        needs_clarification: false,
        clarification_question: None,
        raw_text: text.trim().to_string(),
    };

    if still_incomplete(&candidate) {
        // Seguimos esperando el dato faltante.
        sim.pending_clarification = Some(PendingClarification {
            kind: pending.kind,
            params: candidate.params,
            question: pending.question,
        });
        return None;
    }

    Some(candidate)
}

fn still_incomplete(candidate: &ParsedOrder) -> bool {
    use codeblue_domain_orders::OrderParams;
    match (&candidate.kind, &candidate.params) {
        (ParsedOrderKind::Fluids, OrderParams::Fluids(fluids)) => {
            fluids.ml_per_kg.is_none() && fluids.total_ml.is_none()
        }
        (ParsedOrderKind::Adenosine, OrderParams::Adenosine(adenosine)) => {
            adenosine.dose_milligrams.is_none()
        }
        (ParsedOrderKind::Cardioversion, OrderParams::Cardioversion(cardioversion)) => {
            cardioversion.joules.is_none()
        }
        (ParsedOrderKind::Intubation, OrderParams::Intubation(intubation)) => {
            intubation.induction_agent.is_none()
        }
        _ => false,
    }
}

/// Ejecuta una orden parseada: diagnósticos al escritorio, tratamientos
/// al manejador del escenario.
async fn execute_parsed_order(
    app: &AppState,
    context: &ConnectionContext,
    user_id: &str,
    parsed: ParsedOrder,
) {
    let session = &context.session;

    // 1. DIAGNÓSTICOS Y EXÁMENES -> ESCRITORIO DE ÓRDENES
    let desk_route: Option<(OrderKind, Option<String>)> = match parsed.kind {
        ParsedOrderKind::VitalsCheck => Some((OrderKind::Vitals, None)),
        ParsedOrderKind::Ecg => Some((OrderKind::Ekg, None)),
        ParsedOrderKind::Labs => Some((OrderKind::Labs, None)),
        ParsedOrderKind::Abg => Some((OrderKind::Labs, Some("abg".to_string()))),
        ParsedOrderKind::Echo => Some((OrderKind::Imaging, Some("echo".to_string()))),
        ParsedOrderKind::ChestXray => Some((OrderKind::Imaging, Some("cxr".to_string()))),
        ParsedOrderKind::IvAccess => Some((OrderKind::IvAccess, None)),
        ParsedOrderKind::CardiacExam => Some((OrderKind::CardiacExam, None)),
        ParsedOrderKind::LungExam => Some((OrderKind::LungExam, None)),
        ParsedOrderKind::GeneralExam => Some((OrderKind::GeneralExam, None)),
        _ => None,
    };

    if let Some((kind, flavor)) = desk_route {
        order_desk::handle_order(app, session, kind, flavor, Some(user_id.to_string())).await;
        return;
    }

    // 2. TRATAMIENTOS -> MANEJADOR DEL ESCENARIO (bajo el cerrojo)
    let now = now_ms();
    let mut sim = session.sim.lock().await;

    let mut rng = rand::thread_rng();
    let report = apply_treatment(&mut sim, &parsed, now, &mut rng);

    match report {
        Some(mut report) => {
            // Reglas tras el tratamiento exitoso.
            let physiology = run_physiology_pass(&mut sim, now);
            report.changed |= physiology.changed;
            report.events.extend(physiology.events);
            report.lines.extend(physiology.lines);

            let payload = sim.sim_state_payload();
            let state_snapshot = report.changed.then(|| sim.get_state());
            drop(sim);

            for (character, line) in report.lines {
                session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                    session_id: context.session_id.clone(),
                    text: line,
                    character: Some(character),
                });
            }
            if report.changed {
                session.broadcast(&OutboundMessage::SimState(payload));
                if let Some(state) = state_snapshot {
                    app.persist_state(state);
                }
            }
            app.log_events(&context.session_id, report.events);
        }
        None => {
            drop(sim);
            // Escenario simple: la enfermera reconduce al objetivo docente.
            session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                session_id: context.session_id.clone(),
                text: "Let's keep working through the assessment — she's stable right now.".to_string(),
                character: Some("nurse".to_string()),
            });
        }
    }
}

/// Salta al siguiente estadio del catálogo (mando de presentador).
async fn skip_to_next_stage(app: &AppState, context: &ConnectionContext) {
    let session = &context.session;
    let now = now_ms();

    let (events, payload, state_snapshot) = {
        let mut sim = session.sim.lock().await;

        let current_index = sim
            .scenario
            .stages
            .iter()
            .position(|stage| stage.id == sim.state.stage_id);
        let next_stage_id = current_index
            .and_then(|index| sim.scenario.stages.get(index + 1))
            .map(|stage| stage.id.clone());

        let Some(next_stage_id) = next_stage_id else {
            return;
        };
        let Some(stage_events) = sim.set_stage(&next_stage_id, now) else {
            return;
        };

        (stage_events, sim.sim_state_payload(), sim.get_state())
    };

    session.broadcast(&OutboundMessage::SimState(payload));
    app.persist_state(state_snapshot);
    app.log_events(&context.session_id, events);
}

/// Reinstala el núcleo de simulación con el escenario solicitado.
async fn reset_scenario(app: &AppState, context: &ConnectionContext, scenario_id: ScenarioId) {
    let session = &context.session;
    let now = now_ms();

    let (payload, state_snapshot) = {
        let mut sim = session.sim.lock().await;
        *sim = SimCore::new(&context.session_id, scenario_id, now);
        // La bandera de fallback del núcleo hereda la realidad del enlace.
        sim.voice_connected = session.voice.lock().expect("voice poisoned").is_some();
        sim.state.fallback = !sim.voice_connected;
        (sim.sim_state_payload(), sim.get_state())
    };

    session.broadcast(&OutboundMessage::ScenarioChanged {
        session_id: context.session_id.clone(),
        scenario_id,
    });
    session.broadcast(&OutboundMessage::SimState(payload));
    app.persist_state(state_snapshot);
    app.log_events(
        &context.session_id,
        vec![SimEvent::with_payload(
            now,
            EventKind::StateDiff,
            serde_json::json!({ "source": "set_scenario", "scenario": scenario_id.wire_label() }),
        )],
    );

    info!(
        "🎭 [DISPATCHER]: Session {} re-armed with scenario '{}'.",
        context.session_id,
        scenario_id.wire_label()
    );
}

// --- UTILERÍA LOCAL ---

fn is_muted(session: &Arc<SessionRuntime>, user_id: &str) -> bool {
    session
        .muted_users
        .read()
        .expect("muted users poisoned")
        .contains(user_id)
}

async fn commit_voice_if_live(session: &Arc<SessionRuntime>) {
    let fallback = {
        let cost = session.cost.lock().expect("cost poisoned");
        cost.is_fallback()
    };
    if fallback {
        return;
    }
    let voice_guard = session.voice.lock().expect("voice poisoned");
    if let Some(voice) = voice_guard.as_ref() {
        voice.commit_audio();
    }
}

fn send_direct(reply_sender: &mpsc::UnboundedSender<String>, message: &OutboundMessage) {
    let _ = reply_sender.send(codeblue_domain_models::wire::render_outbound(message));
}

/// Notifica las tramas de despedida al cerrar la conexión.
pub fn handle_disconnect(app: &AppState, context: &ConnectionContext) {
    app.registry
        .leave(&context.session_id, &context.user_id, context.connection_id);

    context.session.broadcast(&OutboundMessage::ParticipantState {
        session_id: context.session_id.clone(),
        user_id: context.user_id.clone(),
        speaking: false,
        character: None,
    });

    warn!(
        "👋 [DISPATCHER]: User {} disconnected from session {} (in-flight work continues).",
        context.user_id, context.session_id
    );
}
