// [apps/gateway/src/services/heartbeat.rs]
/*!
 * =================================================================
 * APARATO: SCENARIO HEARTBEAT SERVICE (V9.0 - OPPORTUNISTIC TICK)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: LATIDO PERIÓDICO DE UNA SESIÓN DE SIMULACIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPPORTUNISTIC LOCKING: El latido usa 'try_lock'; si un
 *    tratamiento sostiene el cerrojo, el tick se DESCARTA (no se
 *    encola). El siguiente pase recupera el delta completo vía
 *    'last_tick_ms'.
 * 2. ONE FRAME PER TICK: deriva + transiciones + reglas + triggers +
 *    alarmas se fusionan en UNA trama 'sim_state' y una escritura.
 * 3. WEAK ANCHOR: La tarea sostiene un Weak de la sesión; el reaper
 *    puede desmantelarla sin coordinar con el latido.
 * =================================================================
 */

use crate::config::now_ms;
use crate::sim::{run_physiology_pass, SimCore};
use crate::state::{AppState, SessionRuntime};
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::wire::OutboundMessage;
use codeblue_domain_physiology::alarms::check_alarms;
use codeblue_domain_physiology::triggers::{record_fire, run_trigger_pass};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

/// Arranca el latido de una sesión en el runtime de Tokio.
pub fn spawn_heartbeat(app: AppState, session: &Arc<SessionRuntime>) -> tokio::task::JoinHandle<()> {
    let weak_session: Weak<SessionRuntime> = Arc::downgrade(session);
    let interval_ms = app.config.heartbeat_interval_ms;

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(interval_ms));
        info!("💓 [HEARTBEAT]: Pacemaker ignited at {} ms cadence.", interval_ms);

        loop {
            ticker.tick().await;

            let Some(session) = weak_session.upgrade() else {
                debug!("💓 [HEARTBEAT]: Session dismantled — pacemaker retiring.");
                break;
            };

            if session.is_frozen() {
                continue;
            }

            run_heartbeat_pass(&app, &session).await;
        }
    })
}

/**
 * Un pase completo de latido. Público para el Proving Grounds.
 */
pub async fn run_heartbeat_pass(app: &AppState, session: &Arc<SessionRuntime>) {
    // Tick oportunista: si un tratamiento tiene el cerrojo, cedemos.
    let Ok(mut sim) = session.sim.try_lock() else {
        debug!("💓 [HEARTBEAT]: Lock busy — tick skipped (recovered next pass).");
        return;
    };

    let now = now_ms();
    let mut events: Vec<SimEvent> = Vec::new();
    let mut lines: Vec<(String, String)> = Vec::new();

    // 1. DERIVA + TRANSICIONES AUTOMÁTICAS
    let tick_outcome = sim.tick(now);
    let mut changed = tick_outcome.changed;
    events.extend(tick_outcome.events);

    // 2. MOTOR DE REGLAS (escenarios complejos)
    let physiology = run_physiology_pass(&mut sim, now);
    changed |= physiology.changed;
    events.extend(physiology.events);
    lines.extend(physiology.lines);

    // 3. DISPARADORES DE PERSONAJE
    run_character_triggers(&mut sim, now, &mut lines);

    // 4. VIGILANCIA DE ALARMAS (debounce >= 4 s)
    let age_months = sim.scenario.patient.age_months;
    let vitals_snapshot = sim.state.vitals.clone();
    let firings = check_alarms(&vitals_snapshot, age_months, &mut sim.alarm_tracker, now);
    for firing in firings {
        events.push(SimEvent::with_payload(
            now,
            EventKind::AlarmFired,
            serde_json::json!({ "alarm": firing.kind.wire_label(), "message": firing.message }),
        ));
        lines.push(("nurse".to_string(), firing.message));
        changed = true;
    }

    // 5. SNAPSHOT DE PRESUPUESTO Y BANDERA DE FALLBACK
    let (budget_snapshot, cost_fallback) = {
        let cost = session.cost.lock().expect("cost governor poisoned");
        (cost.snapshot(), cost.is_fallback())
    };
    let fallback_now = cost_fallback || !sim.voice_connected;
    if sim.state.fallback != fallback_now {
        sim.state.fallback = fallback_now;
        changed = true;
    }
    sim.state.budget = Some(budget_snapshot);

    // 6. DIFUSIÓN Y PERSISTENCIA FUERA DEL CERROJO
    let payload = sim.sim_state_payload();
    let state_snapshot = if changed { Some(sim.get_state()) } else { None };
    drop(sim);

    for (character, line) in lines {
        session.broadcast(&OutboundMessage::PatientTranscriptDelta {
            session_id: session.session_id.clone(),
            text: line,
            character: Some(character),
        });
    }

    if let Some(state) = state_snapshot {
        session.broadcast(&OutboundMessage::SimState(payload));
        app.persist_state(state);
    }

    app.log_events(&session.session_id, events);
}

/// Pase del motor de disparadores con su contabilidad.
fn run_character_triggers(sim: &mut SimCore, now: i64, lines: &mut Vec<(String, String)>) {
    let Some(pools) = sim.scenario.triggers.as_ref() else { return };
    let Some(extended) = sim.state.extended.as_ref() else { return };

    let elapsed_ms = now - sim.state.scenario_started_at;
    let mut rng = rand::thread_rng();

    if let Some(fired) = run_trigger_pass(pools, extended, elapsed_ms, &sim.trigger_history, now, &mut rng) {
        record_fire(&mut sim.trigger_history, &fired.id, now);
        lines.push((fired.character.wire_label().to_string(), fired.line));
    }
}
