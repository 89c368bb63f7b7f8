// [apps/gateway/src/services/order_desk.rs]
/*!
 * =================================================================
 * APARATO: CLINICAL ORDER DESK (V11.0 - SINGLE PENDING SOVEREIGN)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: CICLO PENDING -> COMPLETE DE ÓRDENES DIAGNÓSTICAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE PENDING: A lo sumo UNA orden pendiente por tipo y sesión;
 *    el duplicado responde "still working on that" sin crear registro.
 * 2. LOCK RELEASE DISCIPLINE: La finalización programada LIBERA el
 *    cerrojo y lo re-adquiere tras la latencia; un desconecte del
 *    cliente no cancela la finalización en vuelo.
 * 3. CHARACTER VOICING: El técnico habla por EKG e imágenes, la
 *    enfermera por laboratorios y exámenes.
 * =================================================================
 */

use crate::config::now_ms;
use crate::sim::treatments::myocarditis as myo_treatments;
use crate::sim::{run_physiology_pass, SimCore};
use crate::state::{AppState, SessionRuntime};
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::orders::{Order, OrderKind, OrderResult};
use codeblue_domain_models::state::EkgRecord;
use codeblue_domain_models::wire::OutboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Latencia de finalización por tipo de orden (milisegundos).
fn completion_latency_ms(kind: OrderKind, flavor: Option<&str>) -> u64 {
    match (kind, flavor) {
        (OrderKind::Labs, Some("abg")) => 5_000,
        (OrderKind::Labs, _) => 8_000,
        (OrderKind::Imaging, Some("echo")) => 12_000,
        (OrderKind::Imaging, _) => 3_000,
        (OrderKind::Ekg, _) => 2_500,
        (OrderKind::Vitals, _) => 1_500,
        (OrderKind::IvAccess, _) => 2_000,
        _ => 2_000,
    }
}

/// Personaje que vocaliza el resultado de la orden.
fn speaking_character(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Ekg | OrderKind::Imaging => "tech",
        _ => "nurse",
    }
}

/**
 * Punto de entrada del escritorio: crea la orden pendiente (o responde
 * al duplicado) y programa su finalización tras la latencia nominal.
 */
pub async fn handle_order(
    app: &AppState,
    session: &Arc<SessionRuntime>,
    kind: OrderKind,
    flavor: Option<String>,
    ordered_by: Option<String>,
) {
    let now = now_ms();
    let mut events: Vec<SimEvent> = Vec::new();

    // 1. CREACIÓN BAJO EL CERROJO (dedupe soberano)
    let created_order_id = {
        let mut sim = session.sim.lock().await;

        if sim.pending_orders.contains_key(&kind) {
            // Duplicado: la enfermera responde, sin segundo registro.
            drop(sim);
            session.broadcast(&OutboundMessage::PatientTranscriptDelta {
                session_id: session.session_id.clone(),
                text: format!("We're still working on that {} — results coming.", kind.wire_label()),
                character: Some("nurse".to_string()),
            });
            app.log_events(
                &session.session_id,
                vec![SimEvent::with_payload(
                    now,
                    EventKind::OrderDuplicate,
                    serde_json::json!({ "type": kind.wire_label() }),
                )],
            );
            return;
        }

        let order = Order::pending(kind, now, ordered_by);
        let order_id = order.id.clone();
        sim.pending_orders.insert(kind, order_id.clone());
        sim.state.orders.push(order);

        // Registro de diagnóstico del escenario (eco, placa, gases, ECG).
        register_scenario_diagnostic(&mut sim, kind, flavor.as_deref(), now);

        events.push(SimEvent::with_payload(
            now,
            EventKind::OrderCreated,
            serde_json::json!({ "order_id": order_id, "type": kind.wire_label() }),
        ));

        let payload = sim.sim_state_payload();
        let state_snapshot = sim.get_state();
        drop(sim);

        session.broadcast(&OutboundMessage::SimState(payload));
        app.persist_state(state_snapshot);
        order_id
    };

    app.log_events(&session.session_id, events);

    info!(
        "📋 [ORDER_DESK]: Order '{}' created for session {} ({}).",
        kind.wire_label(),
        session.session_id,
        created_order_id
    );

    // 2. FINALIZACIÓN PROGRAMADA (fuera del cerrojo; sobrevive al
    //    desconecte del cliente que la emitió).
    let app_for_completion = app.clone();
    let session_for_completion = session.clone();
    let latency = completion_latency_ms(kind, flavor.as_deref());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(latency)).await;
        complete_order(
            &app_for_completion,
            &session_for_completion,
            kind,
            flavor,
            created_order_id,
        )
        .await;
    });
}

/// Finalización de la orden: re-adquiere el cerrojo y sella el resultado.
async fn complete_order(
    app: &AppState,
    session: &Arc<SessionRuntime>,
    kind: OrderKind,
    flavor: Option<String>,
    order_id: String,
) {
    let now = now_ms();
    let mut sim = session.sim.lock().await;

    let result = compose_result(&mut sim, kind, flavor.as_deref(), now);
    let summary_line = result.summary.clone();

    let Some(order) = sim.state.orders.iter_mut().find(|order| order.id == order_id) else {
        debug!("📋 [ORDER_DESK]: Order {} vanished before completion (scenario reset).", order_id);
        return;
    };
    order.complete(result, now);
    sim.pending_orders.remove(&kind);

    apply_completion_side_effects(&mut sim, kind, now);

    // Reglas tras la intervención exitosa (espec. ECG/IV en complejos).
    let physiology = run_physiology_pass(&mut sim, now);

    let mut events = vec![SimEvent::with_payload(
        now,
        EventKind::OrderCompleted,
        serde_json::json!({ "order_id": order_id, "type": kind.wire_label() }),
    )];
    events.extend(physiology.events);

    let payload = sim.sim_state_payload();
    let state_snapshot = sim.get_state();
    let extra_lines = physiology.lines;
    drop(sim);

    session.broadcast(&OutboundMessage::PatientTranscriptDelta {
        session_id: session.session_id.clone(),
        text: summary_line,
        character: Some(speaking_character(kind).to_string()),
    });
    for (character, line) in extra_lines {
        session.broadcast(&OutboundMessage::PatientTranscriptDelta {
            session_id: session.session_id.clone(),
            text: line,
            character: Some(character),
        });
    }

    session.broadcast(&OutboundMessage::SimState(payload));
    app.persist_state(state_snapshot);
    app.log_events(&session.session_id, events);
}

/// Registra el diagnóstico del escenario al CREAR la orden.
fn register_scenario_diagnostic(sim: &mut SimCore, kind: OrderKind, flavor: Option<&str>, now: i64) {
    let is_myocarditis = matches!(sim.state.extended, Some(ExtendedState::Myocarditis(_)));
    if !is_myocarditis {
        return;
    }

    let test = match (kind, flavor) {
        (OrderKind::Ekg, _) => Some("ecg"),
        (OrderKind::Imaging, Some("echo")) => Some("echo"),
        (OrderKind::Imaging, _) => Some("cxr"),
        (OrderKind::Labs, Some("abg")) => Some("abg"),
        _ => None,
    };

    if let Some(test) = test {
        myo_treatments::register_diagnostic(sim, test, now);
    }
}

/// Efectos colaterales del cierre de la orden sobre el estado extendido.
fn apply_completion_side_effects(sim: &mut SimCore, kind: OrderKind, now: i64) {
    match kind {
        OrderKind::Ekg => {
            // El EKG enciende la telemetría y alimenta la historia rodante.
            sim.set_telemetry(true, None);
            let record = EkgRecord {
                ordered_at: now,
                rhythm_label: sim.state.rhythm_summary.clone(),
                summary: format!("12-lead — {}", sim.state.rhythm_summary),
                image_url: None,
            };
            sim.state.record_ekg(record);

            let is_myocarditis = matches!(sim.state.extended, Some(ExtendedState::Myocarditis(_)));
            if let Some(ExtendedState::Svt(svt)) = sim.state.extended.as_mut() {
                svt.ecg_ordered = true;
            }
            if is_myocarditis {
                myo_treatments::complete_diagnostic(sim, "ecg", now);
            }
        }
        OrderKind::IvAccess => {
            let iv_points = sim
                .scenario
                .scoring
                .as_ref()
                .and_then(|scoring| scoring.checklist_item("iv_access"))
                .map(|item| item.points)
                .unwrap_or(0.0);

            let is_myocarditis = matches!(sim.state.extended, Some(ExtendedState::Myocarditis(_)));
            if let Some(ExtendedState::Svt(svt)) = sim.state.extended.as_mut() {
                if !svt.iv_access {
                    svt.iv_access = true;
                    svt.scoring.complete_checklist_item("iv_access", iv_points);
                }
            }
            if is_myocarditis {
                myo_treatments::record_iv_access(sim, None, now);
            }
        }
        _ => {}
    }
    sim.log_intervention(kind.wire_label());
}

/// Compone el resultado guionado de la orden según el escenario.
fn compose_result(sim: &mut SimCore, kind: OrderKind, flavor: Option<&str>, now: i64) -> OrderResult {
    let rhythm = sim.state.rhythm_summary.clone();
    let vitals = sim.state.vitals.clone();
    let is_myocarditis = matches!(sim.state.extended, Some(ExtendedState::Myocarditis(_)));
    let is_svt = matches!(sim.state.extended, Some(ExtendedState::Svt(_)));

    match kind {
        OrderKind::Vitals => OrderResult {
            summary: format!(
                "Latest set: HR {}, RR {}, SpO2 {}%, BP {}.",
                vitals.heart_rate.round() as i64,
                vitals.respiratory_rate.round() as i64,
                vitals.oxygen_saturation.round() as i64,
                vitals.blood_pressure
            ),
            abnormal: None,
            image_url: None,
            meta: None,
        },
        OrderKind::Ekg => OrderResult {
            summary: format!("12-lead is up — {rhythm}."),
            abnormal: Some(!rhythm.starts_with("Normal sinus")),
            image_url: None,
            meta: Some(serde_json::json!({ "rhythm": rhythm })),
        },
        OrderKind::Labs => {
            if flavor == Some("abg") {
                let scripted = if is_myocarditis {
                    myo_treatments::complete_diagnostic(sim, "abg", now)
                        .unwrap_or_else(|| "Gas is back — mild respiratory alkalosis.".to_string())
                } else {
                    "Gas is back — within normal limits.".to_string()
                };
                OrderResult {
                    summary: scripted,
                    abnormal: Some(is_myocarditis),
                    image_url: None,
                    meta: Some(serde_json::json!({ "study": "abg" })),
                }
            } else if is_myocarditis {
                OrderResult {
                    summary: "Labs are back — troponin 2.3, BNP 1850, lactate 4.1. That's a sick heart.".to_string(),
                    abnormal: Some(true),
                    image_url: None,
                    meta: None,
                }
            } else if is_svt {
                OrderResult {
                    summary: "Labs are back — CBC and chemistry unremarkable, troponin pending.".to_string(),
                    abnormal: Some(false),
                    image_url: None,
                    meta: None,
                }
            } else {
                OrderResult {
                    summary: "Labs are back — everything within normal limits.".to_string(),
                    abnormal: Some(false),
                    image_url: None,
                    meta: None,
                }
            }
        }
        OrderKind::Imaging => {
            let study = flavor.unwrap_or("cxr");
            let scripted = if is_myocarditis {
                myo_treatments::complete_diagnostic(sim, study, now)
            } else {
                None
            };
            let summary = scripted.unwrap_or_else(|| match study {
                "echo" => "Echo looks structurally normal with brisk function.".to_string(),
                _ => "Chest film is unremarkable.".to_string(),
            });
            OrderResult {
                summary,
                abnormal: Some(is_myocarditis),
                image_url: None,
                meta: Some(serde_json::json!({ "study": study })),
            }
        }
        OrderKind::CardiacExam => OrderResult {
            summary: sim
                .state
                .exam
                .get("cardiac")
                .cloned()
                .unwrap_or_else(|| "Regular rhythm, no murmurs or gallops.".to_string()),
            abnormal: None,
            image_url: None,
            meta: None,
        },
        OrderKind::LungExam => OrderResult {
            summary: sim
                .state
                .exam
                .get("lungs")
                .cloned()
                .unwrap_or_else(|| "Clear to auscultation bilaterally.".to_string()),
            abnormal: None,
            image_url: None,
            meta: None,
        },
        OrderKind::GeneralExam => OrderResult {
            summary: sim
                .state
                .exam
                .get("general")
                .cloned()
                .unwrap_or_else(|| "Alert, no acute distress.".to_string()),
            abnormal: None,
            image_url: None,
            meta: None,
        },
        OrderKind::IvAccess => OrderResult {
            summary: "IV is in — 20 gauge, flushing well.".to_string(),
            abnormal: None,
            image_url: None,
            meta: None,
        },
    }
}
