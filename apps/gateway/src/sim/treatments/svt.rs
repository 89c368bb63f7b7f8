// [apps/gateway/src/sim/treatments/svt.rs]
/*!
 * =================================================================
 * APARATO: SVT TREATMENT HANDLERS (V9.0 - CONVERSION LEDGER)
 * CLASIFICACIÓN: APPLICATION LOGIC (ESTRATO L1-APP)
 * RESPONSABILIDAD: VAGALES, ADENOSINA, CARDIOVERSIÓN Y PUNTAJE
 *
 * Contrato farmacológico del escenario:
 * - Vagales: cuentan el intento pero no convierten este caso guionado.
 * - Adenosina dosis 1 correcta (0.08-0.12 mg/kg): conversión sellada.
 * - Adenosina dosis 2 correcta (0.15-0.25 mg/kg): conversión sellada.
 * - Dosis fuera de rango: conversión probabilística (RNG inyectado).
 * - Cardioversión sincronizada 0.5-2 J/kg: conversión sellada.
 * =================================================================
 */

use super::TreatmentReport;
use crate::sim::SimCore;
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::extended::svt::{
    AdenosineDose, CardioversionAttempt, ConversionMethod, SvtExtendedState, SvtPhase, SvtRhythm,
};
use codeblue_domain_models::extended::{append_timeline, ExtendedState, TimelineEvent};
use codeblue_domain_orders::{OrderParams, ParsedOrder, ParsedOrderKind};
use rand::Rng;
use tracing::info;

/// Rango de dosis correcta de la primera adenosina (mg/kg).
const FIRST_DOSE_RANGE: (f64, f64) = (0.08, 0.12);
/// Rango de dosis correcta de la segunda adenosina (mg/kg).
const SECOND_DOSE_RANGE: (f64, f64) = (0.15, 0.25);
/// Rango de energía correcta de cardioversión (J/kg).
const CARDIOVERSION_RANGE: (f64, f64) = (0.5, 2.0);
/// Probabilidad de conversión con dosis fuera de rango.
const OFF_DOSE_CONVERSION_PROBABILITY: f64 = 0.25;

pub fn apply<R: Rng>(sim: &mut SimCore, parsed: &ParsedOrder, now: i64, rng: &mut R) -> TreatmentReport {
    let mut report = TreatmentReport::default();

    match parsed.kind {
        ParsedOrderKind::VagalManeuver => apply_vagal(sim, now, &mut report),
        ParsedOrderKind::Adenosine => apply_adenosine(sim, parsed, now, rng, &mut report),
        ParsedOrderKind::Cardioversion => apply_cardioversion(sim, parsed, now, rng, &mut report),
        ParsedOrderKind::Sedation => {
            with_svt(sim, |svt| svt.sedation_given = true);
            record_timeline(sim, now, "sedation_given", None);
            report.say("nurse", "Sedation is in — she's comfortable.");
            report.changed = true;
        }
        ParsedOrderKind::Monitor => ensure_monitor(sim, now, &mut report),
        ParsedOrderKind::DefibPads => {
            record_timeline(sim, now, "defib_pads_placed", None);
            report.say("nurse", "Pads are on and the defibrillator is at the bedside.");
        }
        ParsedOrderKind::Oxygen => {
            sim.log_intervention("oxygen");
            report.say("nurse", "Oxygen is on by nasal cannula.");
        }
        ParsedOrderKind::ConsultCardiology => {
            let newly_recorded = with_svt(sim, |svt| svt.record_consult("cardiology"));
            if newly_recorded {
                complete_checklist(sim, "cardiology_consult");
                report.say("nurse", "Cardiology is on the phone for you.");
                report.changed = true;
            } else {
                report.say("nurse", "Cardiology has already been consulted.");
            }
        }
        ParsedOrderKind::ConsultPicu => {
            if with_svt(sim, |svt| svt.record_consult("picu")) {
                report.say("nurse", "PICU team has been notified.");
                report.changed = true;
            }
        }
        ParsedOrderKind::ConsultEcmo => {
            if with_svt(sim, |svt| svt.record_consult("ecmo")) {
                report.say("nurse", "ECMO team paged — they're aware.");
                report.changed = true;
            }
        }
        _ => {
            report.say("nurse", "That's not something I can do for this patient right now.");
        }
    }

    report
}

fn apply_vagal(sim: &mut SimCore, now: i64, report: &mut TreatmentReport) {
    ensure_monitor(sim, now, report);
    open_treatment_window(sim, now);

    let first_line_credit = with_svt(sim, |svt| {
        svt.vagal_attempts += 1;
        svt.last_vagal_at = Some(now);
        svt.adenosine_doses.is_empty() && svt.cardioversion_attempts.is_empty()
    });

    if first_line_credit {
        complete_checklist(sim, "vagal_first");
    }

    record_timeline(sim, now, "vagal_maneuver", None);
    sim.log_intervention("vagal_maneuver");

    // Este caso guionado no convierte con vagales: la lección es la
    // escalera terapéutica completa.
    let still_in_svt = with_svt(sim, |svt| svt.current_rhythm == SvtRhythm::Svt);
    if still_in_svt {
        report.say("nurse", "Good vagal attempt — no change on the monitor, she's still in SVT.");
    } else {
        report.say("nurse", "Vagal maneuver done.");
    }

    report.events.push(treatment_event(now, "vagal_maneuver"));
    report.changed = true;
}

fn apply_adenosine<R: Rng>(
    sim: &mut SimCore,
    parsed: &ParsedOrder,
    now: i64,
    rng: &mut R,
    report: &mut TreatmentReport,
) {
    let OrderParams::Adenosine(params) = &parsed.params else {
        report.say("nurse", "What dose of adenosine do you want?");
        return;
    };
    let Some(dose_milligrams) = params.dose_milligrams else {
        report.say("nurse", "What dose of adenosine do you want?");
        return;
    };

    ensure_monitor(sim, now, report);
    open_treatment_window(sim, now);

    let weight_kg = sim.scenario.patient.weight_kg;
    let dose_mg_per_kg = dose_milligrams / weight_kg;

    let Some(dose_number) = with_svt(sim, |svt| svt.next_adenosine_dose_number()) else {
        report.say("nurse", "She's already had two doses of adenosine — maximum reached.");
        return;
    };

    let iv_missing = with_svt(sim, |svt| !svt.iv_access);
    if iv_missing {
        // Sin IV el empuje rápido es imposible; la enfermera lo resuelve.
        with_svt(sim, |svt| svt.iv_access = true);
        complete_checklist(sim, "iv_access");
        report.say("nurse", "Getting a line in first — okay, IV is in the right AC.");
    }

    with_svt(sim, |svt| {
        svt.adenosine_doses.push(AdenosineDose {
            dose_number,
            dose_milligrams,
            dose_mg_per_kg,
            rapid_push: params.rapid_push,
            flush_given: params.flush_requested,
            given_at: now,
        });
    });

    record_timeline(
        sim,
        now,
        "adenosine_given",
        Some(format!("dose {} — {:.1} mg ({:.2} mg/kg)", dose_number, dose_milligrams, dose_mg_per_kg)),
    );
    sim.log_intervention("adenosine");

    let dose_range = if dose_number == 1 { FIRST_DOSE_RANGE } else { SECOND_DOSE_RANGE };
    let dose_correct = dose_mg_per_kg >= dose_range.0 && dose_mg_per_kg <= dose_range.1;

    if dose_correct {
        complete_checklist(sim, "adenosine_dose_correct");
    }
    if params.flush_requested {
        complete_checklist(sim, "adenosine_flush");
    }
    if !params.rapid_push {
        incur_penalty(sim, "adenosine_slow_push");
        report.say("nurse", "Pushing it... slow push though — adenosine really wants a fast flush behind it.");
    }

    // Contrato de conversión: dosis correcta sella el desenlace; dosis
    // fuera de rango queda a merced del nodo AV (RNG del manejador).
    let converts = dose_correct || rng.gen_bool(OFF_DOSE_CONVERSION_PROBABILITY);

    report.events.push(treatment_event(now, "adenosine"));

    if converts {
        let method = if dose_number == 1 {
            ConversionMethod::AdenosineFirst
        } else {
            ConversionMethod::AdenosineSecond
        };
        seal_conversion(sim, method, now, report);
    } else {
        report.say(
            "nurse",
            "Brief pause on the monitor... and she's back in SVT. Dose may have been off for her weight.",
        );
    }

    report.changed = true;
}

fn apply_cardioversion<R: Rng>(
    sim: &mut SimCore,
    parsed: &ParsedOrder,
    now: i64,
    rng: &mut R,
    report: &mut TreatmentReport,
) {
    let OrderParams::Cardioversion(params) = &parsed.params else {
        report.say("nurse", "How many joules?");
        return;
    };
    let Some(joules) = params.joules else {
        report.say("nurse", "How many joules?");
        return;
    };

    ensure_monitor(sim, now, report);
    open_treatment_window(sim, now);

    let weight_kg = sim.scenario.patient.weight_kg;
    let joules_per_kg = joules / weight_kg;
    let synchronized = params.synchronized.unwrap_or(true);
    let sedation_given = with_svt(sim, |svt| svt.sedation_given);

    with_svt(sim, |svt| {
        svt.cardioversion_attempts.push(CardioversionAttempt {
            joules,
            joules_per_kg,
            synchronized,
            sedation_given,
            performed_at: now,
        });
        if svt.phase != SvtPhase::Converted {
            svt.phase = SvtPhase::CardioversionDecision;
            svt.phase_entered_at = now;
        }
    });

    record_timeline(
        sim,
        now,
        "cardioversion",
        Some(format!("{joules:.0} J ({joules_per_kg:.2} J/kg), synchronized={synchronized}")),
    );
    sim.log_intervention("cardioversion");
    report.events.push(treatment_event(now, "cardioversion"));

    if !synchronized {
        incur_penalty(sim, "unsynchronized_cardioversion");
        sim.apply_vitals_adjustment(&codeblue_domain_models::vitals::VitalsDelta {
            systolic: Some(-6.0),
            ..Default::default()
        });
        report.say(
            "nurse",
            "That was an unsynchronized shock — she's still in SVT and her pressure dipped. Sync next time.",
        );
        report.changed = true;
        return;
    }

    if sedation_given {
        earn_bonus(sim, "sedation_before_cardioversion");
    }

    let energy_correct = joules_per_kg >= CARDIOVERSION_RANGE.0 && joules_per_kg <= CARDIOVERSION_RANGE.1;
    let converts = energy_correct || rng.gen_bool(0.5);

    if converts {
        seal_conversion(sim, ConversionMethod::Cardioversion, now, report);
    } else {
        report.say("nurse", "No conversion with that energy — still narrow complex and fast.");
    }

    report.changed = true;
}

/// Sella la conversión a sinusal: estado extendido, estadio y puntaje.
fn seal_conversion(
    sim: &mut SimCore,
    method: ConversionMethod,
    now: i64,
    report: &mut TreatmentReport,
) {
    let svt_onset_at = with_svt(sim, |svt| {
        svt.mark_converted(method);
        svt.timeline
            .iter()
            .find(|event| event.label == "svt_onset")
            .map(|event| event.ts)
    });

    // El estadio 'converted' instala los vitales post-conversión.
    if let Some(stage_events) = sim.set_stage("converted", now) {
        report.events.extend(stage_events);
    }

    let monitor_running = with_svt(sim, |svt| svt.monitor_on);
    if monitor_running {
        complete_checklist(sim, "continuous_monitoring");
    }
    if let Some(onset_ts) = svt_onset_at {
        if now - onset_ts <= 300_000 {
            earn_bonus(sim, "rapid_conversion");
        }
    }

    record_timeline(sim, now, "converted", Some(format!("{method:?}")));

    info!(
        "💚 [SVT_TREATMENT]: Session {} converted to sinus via {:?}.",
        sim.state.session_id, method
    );

    report.events.push(SimEvent::with_payload(
        now,
        EventKind::PhaseChanged,
        serde_json::json!({ "phase": "converted", "method": format!("{method:?}") }),
    ));
    report.changed = true;
}

/// La enfermera instala el monitor si aún no está puesto.
fn ensure_monitor(sim: &mut SimCore, now: i64, report: &mut TreatmentReport) {
    let newly_on = with_svt(sim, |svt| {
        if svt.monitor_on {
            false
        } else {
            svt.monitor_on = true;
            true
        }
    });

    if newly_on {
        sim.set_telemetry(true, None);
        complete_checklist(sim, "monitor_on");
        record_timeline(sim, now, "monitor_on", None);
        report.say("nurse", "Getting her on the monitor now.");
        report.changed = true;
    }
}

/// El primer tratamiento abre la ventana terapéutica.
fn open_treatment_window(sim: &mut SimCore, now: i64) {
    with_svt(sim, |svt| {
        if svt.phase == SvtPhase::SvtOnset {
            svt.phase = SvtPhase::TreatmentWindow;
            svt.phase_entered_at = now;
        }
    });
}

// --- UTILERÍA DE PUNTAJE Y TIMELINE ---

fn with_svt<T>(sim: &mut SimCore, mutation: impl FnOnce(&mut SvtExtendedState) -> T) -> T {
    match sim.state.extended.as_mut() {
        Some(ExtendedState::Svt(svt)) => mutation(svt),
        _ => unreachable!("SVT treatment invoked outside SVT scenario"),
    }
}

fn complete_checklist(sim: &mut SimCore, item_id: &str) {
    let points = sim
        .scenario
        .scoring
        .as_ref()
        .and_then(|scoring| scoring.checklist_item(item_id))
        .map(|item| item.points)
        .unwrap_or(0.0);
    with_svt(sim, |svt| svt.scoring.complete_checklist_item(item_id, points));
}

fn earn_bonus(sim: &mut SimCore, bonus_id: &str) {
    let points = sim
        .scenario
        .scoring
        .as_ref()
        .and_then(|scoring| scoring.bonus_item(bonus_id))
        .map(|item| item.points)
        .unwrap_or(0.0);
    with_svt(sim, |svt| svt.scoring.earn_bonus(bonus_id, points));
}

fn incur_penalty(sim: &mut SimCore, penalty_id: &str) {
    let points = sim
        .scenario
        .scoring
        .as_ref()
        .and_then(|scoring| scoring.penalty_item(penalty_id))
        .map(|item| item.points)
        .unwrap_or(0.0);
    with_svt(sim, |svt| svt.scoring.incur_penalty(penalty_id, points));
}

fn record_timeline(sim: &mut SimCore, now: i64, label: &str, detail: Option<String>) {
    with_svt(sim, |svt| {
        append_timeline(&mut svt.timeline, TimelineEvent { ts: now, label: label.to_string(), detail });
    });
}

fn treatment_event(now: i64, treatment: &str) -> SimEvent {
    SimEvent::with_payload(
        now,
        EventKind::TreatmentApplied,
        serde_json::json!({ "treatment": treatment }),
    )
}
