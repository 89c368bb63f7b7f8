// [apps/gateway/src/sim/treatments/myocarditis.rs]
/*!
 * =================================================================
 * APARATO: MYOCARDITIS TREATMENT HANDLERS (V10.0 - FLUID LEDGER)
 * CLASIFICACIÓN: APPLICATION LOGIC (ESTRATO L1-APP)
 * RESPONSABILIDAD: FLUIDOS, INOTRÓPICOS, VÍA AÉREA Y PUNTAJE
 *
 * La validación de seguridad NUNCA rechaza: las advertencias se
 * vocalizan por la enfermera y las trampas disparan sus reglas. El
 * aprendizaje ocurre porque el error se deja ocurrir.
 * =================================================================
 */

use super::TreatmentReport;
use crate::sim::SimCore;
use codeblue_domain_models::events::{EventKind, SimEvent};
use codeblue_domain_models::extended::myocarditis::{
    AirwayIntervention, AirwayMethod, DiagnosticOrder, FluidBolus, FluidType, InductionAgent,
    InotropeDrug, InotropeInfusion, MyocarditisExtendedState, MyoPhase,
};
use codeblue_domain_models::extended::{append_timeline, ExtendedState, TimelineEvent};
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_orders::{
    validate_myocarditis_order, MyocarditisOrderContext, OrderParams, ParsedOrder, ParsedOrderKind,
};
use tracing::{info, warn};

pub fn apply(sim: &mut SimCore, parsed: &ParsedOrder, now: i64) -> TreatmentReport {
    let mut report = TreatmentReport::default();

    // 1. CHEQUEO DE SEGURIDAD DOCENTE (advertencias, jamás rechazo)
    let safety_context = build_safety_context(sim);
    let assessment = validate_myocarditis_order(parsed, &safety_context);
    for warning in &assessment.warnings {
        report.say("nurse", warning.clone());
    }

    // 2. DESPACHO POR CLASE DE TRATAMIENTO
    match parsed.kind {
        ParsedOrderKind::Fluids => apply_fluids(sim, parsed, now, &mut report),
        ParsedOrderKind::EpiDrip => apply_inotrope(sim, InotropeDrug::Epi, parsed, now, &mut report),
        ParsedOrderKind::Milrinone => {
            apply_inotrope(sim, InotropeDrug::Milrinone, parsed, now, &mut report)
        }
        ParsedOrderKind::EpiPush => {
            earn_bonus(sim, "push_dose_epi_ready");
            record_timeline(sim, now, "push_dose_epi_drawn", None);
            report.say("nurse", "Push-dose epi is drawn up and at the bedside.");
            report.changed = true;
        }
        ParsedOrderKind::Intubation => apply_intubation(sim, parsed, now, &mut report),
        ParsedOrderKind::Hfnc => {
            with_myo(sim, |myo| {
                myo.airway = Some(AirwayIntervention {
                    method: AirwayMethod::Hfnc,
                    induction_agent: None,
                    peep_cm_h2o: None,
                    fio2_fraction: Some(0.5),
                    pressor_ready: false,
                    push_dose_epi_drawn: false,
                    performed_at: now,
                });
            });
            record_timeline(sim, now, "hfnc_started", None);
            sim.apply_vitals_adjustment(&VitalsDelta {
                oxygen_saturation: Some(3.0),
                respiratory_rate: Some(-4.0),
                ..VitalsDelta::default()
            });
            report.say("nurse", "High-flow is on — he's tolerating it.");
            report.changed = true;
        }
        ParsedOrderKind::Oxygen => {
            sim.apply_vitals_adjustment(&VitalsDelta {
                oxygen_saturation: Some(2.0),
                ..VitalsDelta::default()
            });
            sim.log_intervention("oxygen");
            report.say("nurse", "Oxygen is on.");
            report.changed = true;
        }
        ParsedOrderKind::Monitor => ensure_monitor(sim, now, &mut report),
        ParsedOrderKind::DefibPads => {
            with_myo(sim, |myo| myo.defib_pads_on = true);
            record_timeline(sim, now, "defib_pads_placed", None);
            report.say("nurse", "Pads are on.");
            report.changed = true;
        }
        ParsedOrderKind::ConsultPicu => {
            if with_myo(sim, |myo| myo.record_consult("picu")) {
                complete_checklist(sim, "picu_consult");
                report.say("nurse", "PICU attending is on the line.");
                report.changed = true;
            }
        }
        ParsedOrderKind::ConsultCardiology => {
            if with_myo(sim, |myo| myo.record_consult("cardiology")) {
                complete_checklist(sim, "cardiology_consult");
                report.say("nurse", "Cardiology has been paged for you.");
                report.changed = true;
            }
        }
        ParsedOrderKind::ConsultEcmo => {
            if with_myo(sim, |myo| myo.record_consult("ecmo")) {
                earn_bonus(sim, "ecmo_activation");
                report.say("nurse", "Calling the ECMO coordinator now.");
                report.changed = true;
            }
        }
        _ => {
            report.say("nurse", "I'm not sure that applies to him right now.");
        }
    }

    report
}

fn apply_fluids(sim: &mut SimCore, parsed: &ParsedOrder, now: i64, report: &mut TreatmentReport) {
    let OrderParams::Fluids(params) = &parsed.params else {
        report.say("nurse", "How much volume do you want?");
        return;
    };

    let weight_kg = sim.scenario.patient.weight_kg;
    let ml_per_kg = match (params.ml_per_kg, params.total_ml) {
        (Some(per_kg), _) => per_kg,
        (None, Some(total)) => total / weight_kg,
        (None, None) => {
            report.say("nurse", "How much volume do you want — mL per kilo?");
            return;
        }
    };

    let fluid_type = params.fluid_type.unwrap_or(FluidType::NormalSaline);
    let total_ml = ml_per_kg * weight_kg;

    let total_after = with_myo(sim, |myo| {
        myo.record_fluid_bolus(FluidBolus {
            ml_per_kg,
            total_ml,
            fluid_type,
            rate_minutes: params.rate_minutes,
            given_at: now,
        });
        myo.total_fluids_ml_kg
    });

    record_timeline(
        sim,
        now,
        "fluid_bolus",
        Some(format!("{ml_per_kg:.0} mL/kg ({total_ml:.0} mL), total {total_after:.0} mL/kg")),
    );
    sim.log_intervention("fluid_bolus");

    if ml_per_kg <= 10.0 {
        complete_checklist(sim, "cautious_fluids");
    }
    if total_after > 60.0 {
        incur_penalty(sim, "fluid_overload");
        warn!(
            "🌊 [MYO_TREATMENT]: Session {} exceeded 60 mL/kg in cardiogenic shock.",
            sim.state.session_id
        );
    }

    report.say(
        "nurse",
        format!("Bolus is running — that's {total_after:.0} mL per kilo total now."),
    );
    report
        .events
        .push(treatment_event(now, "fluid_bolus", serde_json::json!({ "ml_per_kg": ml_per_kg })));
    report.changed = true;
}

fn apply_inotrope(
    sim: &mut SimCore,
    drug: InotropeDrug,
    parsed: &ParsedOrder,
    now: i64,
    report: &mut TreatmentReport,
) {
    let dose = match &parsed.params {
        OrderParams::Inotrope(params) => params.dose_mcg_kg_min,
        _ => None,
    }
    .unwrap_or(match drug {
        InotropeDrug::Epi => 0.05,
        InotropeDrug::Milrinone => 0.5,
        _ => 5.0,
    });

    let (already_running, shock_stage) = with_myo(sim, |myo| {
        (myo.running_infusion(drug).is_some(), myo.shock_stage)
    });

    if already_running {
        report.say("nurse", "That infusion is already running — want me to titrate it?");
        return;
    }

    with_myo(sim, |myo| {
        myo.inotropes.push(InotropeInfusion {
            drug,
            dose_mcg_kg_min: dose,
            started_at: now,
            stopped_at: None,
        });
    });

    record_timeline(
        sim,
        now,
        "inotrope_started",
        Some(format!("{drug:?} at {dose} mcg/kg/min")),
    );
    sim.log_intervention("inotrope");

    // Arrancar soporte antes del colapso completo acredita el checklist.
    if shock_stage <= 3 {
        complete_checklist(sim, "early_inotrope");
    }

    report.say("nurse", format!("{drug:?} infusion is up and running."));
    report.events.push(treatment_event(
        now,
        "inotrope",
        serde_json::json!({ "drug": format!("{drug:?}"), "dose_mcg_kg_min": dose }),
    ));
    report.changed = true;
}

fn apply_intubation(sim: &mut SimCore, parsed: &ParsedOrder, now: i64, report: &mut TreatmentReport) {
    let OrderParams::Intubation(params) = &parsed.params else {
        report.say("nurse", "Which induction agent do you want?");
        return;
    };

    let pressor_prepared = params.pressor_ready
        || params.push_dose_epi_drawn
        || with_myo(sim, |myo| {
            myo.scoring.bonuses_earned.iter().any(|bonus| bonus == "push_dose_epi_ready")
                || myo.running_infusion(InotropeDrug::Epi).is_some()
                || myo.running_infusion(InotropeDrug::Norepi).is_some()
        });

    let induction_agent = params.induction_agent;
    let shock_stage = with_myo(sim, |myo| myo.shock_stage);

    with_myo(sim, |myo| {
        myo.airway = Some(AirwayIntervention {
            method: AirwayMethod::Intubation,
            induction_agent,
            peep_cm_h2o: params.peep_cm_h2o.map(|peep| peep.clamp(0.0, 30.0)),
            fio2_fraction: params.fio2_fraction.map(|fio2| fio2.clamp(0.21, 1.0)),
            pressor_ready: pressor_prepared,
            push_dose_epi_drawn: params.push_dose_epi_drawn
                || myo.scoring.bonuses_earned.iter().any(|bonus| bonus == "push_dose_epi_ready"),
            performed_at: now,
        });
        if myo.phase != MyoPhase::IntubationTrap && myo.phase != MyoPhase::End {
            myo.phase = MyoPhase::IntubationTrap;
            myo.phase_entered_at = now;
        }
    });

    record_timeline(
        sim,
        now,
        "intubation",
        induction_agent.map(|agent| format!("{agent:?} induction")),
    );
    sim.log_intervention("intubation");

    match induction_agent {
        Some(InductionAgent::Ketamine) => {
            complete_checklist(sim, "ketamine_induction");
            report.say("nurse", "Ketamine is in — tube passed, good color change.");
        }
        Some(InductionAgent::Etomidate) => {
            report.say("nurse", "Etomidate is in — tube passed, confirming placement.");
        }
        Some(InductionAgent::Propofol) => {
            if shock_stage >= 2 {
                incur_penalty(sim, "propofol_in_shock");
            }
            report.say("nurse", "Propofol going in... tube is passed.");
        }
        None => {
            report.say("nurse", "Tube is in — we induced without a named agent, watch his pressure.");
        }
    }

    if pressor_prepared {
        complete_checklist(sim, "pressor_ready_before_intubation");
    } else {
        incur_penalty(sim, "unprepared_intubation");
    }

    report
        .events
        .push(treatment_event(now, "intubation", serde_json::json!({ "agent": format!("{induction_agent:?}") })));
    report.changed = true;

    info!(
        "🫁 [MYO_TREATMENT]: Session {} airway secured (pressor_ready={}).",
        sim.state.session_id, pressor_prepared
    );
}

/**
 * Registra un diagnóstico del escenario desde el escritorio de
 * órdenes (eco, placa, gases, ECG). Acredita el checklist asociado.
 */
pub fn register_diagnostic(sim: &mut SimCore, test: &str, now: i64) -> bool {
    let already_ordered = with_myo(sim, |myo| {
        myo.diagnostics.iter().any(|diagnostic| diagnostic.test == test)
    });
    if already_ordered {
        return false;
    }

    with_myo(sim, |myo| {
        myo.diagnostics.push(DiagnosticOrder {
            test: test.to_string(),
            ordered_at: now,
            completed_at: None,
            result_text: None,
        });
    });

    match test {
        "echo" => complete_checklist(sim, "echo_ordered"),
        "ecg" => complete_checklist(sim, "ecg_ordered"),
        _ => {}
    }

    record_timeline(sim, now, "diagnostic_ordered", Some(test.to_string()));
    true
}

/// Completa un diagnóstico pendiente con su resultado guionado.
/// Invocado por el escritorio de órdenes tras la latencia del estudio.
pub fn complete_diagnostic(sim: &mut SimCore, test: &str, now: i64) -> Option<String> {
    let result_text = scripted_diagnostic_result(test).to_string();
    let completed = with_myo(sim, |myo| {
        if let Some(diagnostic) = myo
            .diagnostics
            .iter_mut()
            .find(|diagnostic| diagnostic.test == test && diagnostic.completed_at.is_none())
        {
            diagnostic.completed_at = Some(now);
            diagnostic.result_text = Some(result_text.clone());
            true
        } else {
            false
        }
    });

    completed.then_some(result_text)
}

fn scripted_diagnostic_result(test: &str) -> &'static str {
    match test {
        "echo" => "Severely depressed biventricular function, EF roughly 25%, no effusion.",
        "cxr" => "Cardiomegaly with diffuse pulmonary edema.",
        "abg" => "pH 7.21, pCO2 32, lactate 6.8 — metabolic acidosis.",
        _ => "Result pending interpretation.",
    }
}

fn ensure_monitor(sim: &mut SimCore, now: i64, report: &mut TreatmentReport) {
    let newly_on = with_myo(sim, |myo| {
        if myo.monitor_on {
            false
        } else {
            myo.monitor_on = true;
            true
        }
    });

    if newly_on {
        sim.set_telemetry(true, None);
        record_timeline(sim, now, "monitor_on", None);
        report.say("nurse", "He's on the monitor now.");
        report.changed = true;
    }
}

/// Registra un acceso IV (efecto de la orden 'iv_access' completada).
pub fn record_iv_access(sim: &mut SimCore, location: Option<String>, now: i64) {
    with_myo(sim, |myo| {
        myo.iv_count += 1;
        myo.iv_locations.push(location.unwrap_or_else(|| "right AC".to_string()));
    });
    record_timeline(sim, now, "iv_access", None);
}

fn build_safety_context(sim: &mut SimCore) -> MyocarditisOrderContext {
    with_myo(sim, |myo| MyocarditisOrderContext {
        shock_stage: myo.shock_stage,
        total_fluids_ml_kg: myo.total_fluids_ml_kg,
        has_epi_running: myo.running_infusion(InotropeDrug::Epi).is_some()
            || myo.running_infusion(InotropeDrug::Norepi).is_some(),
        has_airway: myo.airway.is_some(),
    })
}

// --- UTILERÍA DE PUNTAJE Y TIMELINE ---

fn with_myo<T>(sim: &mut SimCore, mutation: impl FnOnce(&mut MyocarditisExtendedState) -> T) -> T {
    match sim.state.extended.as_mut() {
        Some(ExtendedState::Myocarditis(myo)) => mutation(myo),
        _ => unreachable!("Myocarditis treatment invoked outside myocarditis scenario"),
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
    with_myo(sim, |myo| myo.scoring.complete_checklist_item(item_id, points));
}

fn earn_bonus(sim: &mut SimCore, bonus_id: &str) {
    let points = sim
        .scenario
        .scoring
        .as_ref()
        .and_then(|scoring| scoring.bonus_item(bonus_id))
        .map(|item| item.points)
        .unwrap_or(0.0);
    with_myo(sim, |myo| myo.scoring.earn_bonus(bonus_id, points));
}

fn incur_penalty(sim: &mut SimCore, penalty_id: &str) {
    let points = sim
        .scenario
        .scoring
        .as_ref()
        .and_then(|scoring| scoring.penalty_item(penalty_id))
        .map(|item| item.points)
        .unwrap_or(0.0);
    with_myo(sim, |myo| myo.scoring.incur_penalty(penalty_id, points));
}

fn record_timeline(sim: &mut SimCore, now: i64, label: &str, detail: Option<String>) {
    with_myo(sim, |myo| {
        append_timeline(&mut myo.timeline, TimelineEvent { ts: now, label: label.to_string(), detail });
    });
}

fn treatment_event(now: i64, treatment: &str, mut payload: serde_json::Value) -> SimEvent {
    if let Some(object) = payload.as_object_mut() {
        object.insert("treatment".to_string(), serde_json::json!(treatment));
    }
    SimEvent::with_payload(now, EventKind::TreatmentApplied, payload)
}
