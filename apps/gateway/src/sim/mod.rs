// [apps/gateway/src/sim/mod.rs]
/*!
 * =================================================================
 * APARATO: SIMULATION CORE UMBRELLA (V6.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: MOTOR DE ESCENARIO + PEGAMENTO DE FISIOLOGÍA
 * =================================================================
 */

pub mod engine;
pub mod treatments;

pub use engine::{IntentApplication, PendingClarification, SimCore, TickOutcome};

use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_physiology::rules::run_rule_pass;

/// Resultado agregado de un pase de fisiología sobre el núcleo.
#[derive(Debug, Default)]
pub struct PhysiologyPassReport {
    pub changed: bool,
    pub events: Vec<SimEvent>,
    /// Líneas de personaje a difundir: (personaje, texto).
    pub lines: Vec<(String, String)>,
}

/**
 * Ejecuta el motor de reglas sobre el estado extendido (si existe) y
 * fusiona su resultado dentro del núcleo: delta de vitales integrado,
 * sincronización fase -> estadio y eventos del ledger.
 *
 * Invocado por el latido en cada tick y por el flujo de tratamientos
 * tras cada intervención exitosa.
 */
pub fn run_physiology_pass(sim: &mut SimCore, now: i64) -> PhysiologyPassReport {
    let mut report = PhysiologyPassReport::default();

    let outcome = match sim.state.extended.as_mut() {
        Some(extended) => run_rule_pass(&sim.scenario.rules, extended, now),
        None => return report,
    };

    if outcome.is_quiet() {
        return report;
    }

    if !outcome.triggered_rule_ids.is_empty() {
        report.events.push(SimEvent::with_payload(
            now,
            EventKind::RuleTriggered,
            serde_json::json!({ "rule_ids": outcome.triggered_rule_ids }),
        ));
    }

    if let Some(delta) = outcome.vitals_delta {
        sim.apply_vitals_adjustment(&delta);
        report.changed = true;
    }

    if let Some((line, _priority)) = outcome.nurse_line {
        report.lines.push(("nurse".to_string(), line));
    }

    if let Some(phase_id) = outcome.phase_changed_to {
        report.events.push(SimEvent::with_payload(
            now,
            EventKind::PhaseChanged,
            serde_json::json!({ "phase": phase_id }),
        ));
        // Sincronización fase -> estadio cuando el catálogo define un
        // estadio homónimo (ej: 'decompensating' en el escenario SVT).
        if sim.scenario.stage(&phase_id).is_some() {
            if let Some(stage_events) = sim.set_stage(&phase_id, now) {
                report.events.extend(stage_events);
            }
        }
        report.changed = true;
    }

    if let Some(stage) = outcome.shock_stage_now {
        report.events.push(SimEvent::with_payload(
            now,
            EventKind::PhaseChanged,
            serde_json::json!({ "shock_stage": stage }),
        ));
        report.changed = true;
    }

    if outcome.stability_level_now.is_some() || !outcome.flags_set.is_empty() {
        report.changed = true;
    }

    if outcome.code_blue_triggered {
        report.events.push(SimEvent::with_payload(
            now,
            EventKind::RuleTriggered,
            serde_json::json!({ "code_blue": true }),
        ));
        report.changed = true;
    }

    if report.changed {
        report.events.push(SimEvent::with_payload(
            now,
            EventKind::StateDiff,
            serde_json::json!({ "source": "physiology" }),
        ));
    }

    report
}
