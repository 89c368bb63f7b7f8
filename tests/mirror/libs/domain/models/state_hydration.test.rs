// [tests/mirror/libs/domain/models/state_hydration.test.rs]
/**
 * =================================================================
 * APARATO: STATE HYDRATION CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MODELS
 * RESPONSABILIDAD: IDENTIDAD DE HIDRATACIÓN Y TOPES DE HISTORIA
 * =================================================================
 */

use codeblue_domain_models::extended::svt::SvtExtendedState;
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::orders::{Order, OrderKind};
use codeblue_domain_models::state::{EkgRecord, ScenarioId, SimulationState, StatePatch};
use codeblue_domain_models::vitals::{Vitals, VitalsDelta};
use std::collections::BTreeMap;

fn probe_state() -> SimulationState {
    SimulationState {
        session_id: "SIM_ROOM_7".to_string(),
        scenario_id: ScenarioId::TeenSvtComplexV1,
        stage_id: "svt_onset".to_string(),
        vitals: Vitals {
            heart_rate: 220.0,
            respiratory_rate: 26.0,
            oxygen_saturation: 96.0,
            temperature: 98.6,
            blood_pressure: "92/58".to_string(),
        },
        exam: BTreeMap::from([("cardiac".to_string(), "Rapid regular tachycardia".to_string())]),
        rhythm_summary: "SVT 220 bpm, narrow complex, regular".to_string(),
        telemetry_enabled: true,
        telemetry_waveform: vec![0.0, 1.0, 0.0],
        telemetry_history: Vec::new(),
        ekg_history: Vec::new(),
        orders: vec![Order::pending(OrderKind::Ekg, 1_000, None)],
        findings: vec!["murmur".to_string()],
        fallback: false,
        budget: None,
        scenario_started_at: 1_000,
        stage_entered_at: 2_000,
        last_tick_ms: 3_000,
        interventions: vec!["vagal_maneuver".to_string()],
        extended: Some(ExtendedState::Svt(SvtExtendedState::initial())),
    }
}

#[test]
fn certify_full_patch_hydration_is_identity() {
    println!("\n💧 [PROVING_GROUNDS]: Auditing hydration identity...");

    let original = probe_state();
    let mut target = probe_state();

    // Perturbar el destino para probar la restitución completa.
    target.stage_id = "presentation".to_string();
    target.vitals.apply_delta(&VitalsDelta { heart_rate: Some(-100.0), ..VitalsDelta::default() });
    target.findings.clear();
    target.extended = None;

    target.hydrate(StatePatch::from(&original));

    assert_eq!(target, original, "L2_STATE_FAULT: hydrate(get_state()) must be the identity.");
    println!("   ✅ [SUCCESS]: Hydration identity certified.");
}

#[test]
fn certify_partial_patch_leaves_rest_untouched() {
    let mut state = probe_state();

    state.hydrate(StatePatch {
        stage_id: Some("converted".to_string()),
        ..StatePatch::default()
    });

    assert_eq!(state.stage_id, "converted");
    assert_eq!(state.vitals.heart_rate, 220.0, "Unpatched fields must survive.");
    assert_eq!(state.findings, vec!["murmur".to_string()]);
}

#[test]
fn certify_ekg_history_bounded_to_three() {
    let mut state = probe_state();

    for index in 0..5 {
        state.record_ekg(EkgRecord {
            ordered_at: index,
            rhythm_label: format!("strip {index}"),
            summary: format!("12-lead {index}"),
            image_url: None,
        });
    }

    assert_eq!(state.ekg_history.len(), 3, "L2_STATE_FAULT: EKG history must hold last 3.");
    // Sobreviven las TRES más recientes.
    assert_eq!(state.ekg_history[0].ordered_at, 2);
    assert_eq!(state.ekg_history[2].ordered_at, 4);
}

#[test]
fn certify_vitals_clamps_after_update() {
    let mut state = probe_state();

    state.vitals.apply_delta(&VitalsDelta {
        oxygen_saturation: Some(-90.0),
        systolic: Some(-200.0),
        diastolic: Some(-200.0),
        ..VitalsDelta::default()
    });

    assert_eq!(state.vitals.oxygen_saturation, 50.0, "SpO2 floor is 50.");
    let pressure = state.vitals.blood_pressure_pair();
    assert_eq!(pressure.systolic, 40.0, "SBP floor is 40.");
    assert_eq!(pressure.diastolic, 20.0, "DBP floor is 20.");

    state.vitals.apply_delta(&VitalsDelta { oxygen_saturation: Some(200.0), ..VitalsDelta::default() });
    assert_eq!(state.vitals.oxygen_saturation, 100.0, "SpO2 ceiling is 100.");
}

#[test]
fn certify_finding_set_semantics() {
    let mut state = probe_state();
    assert!(!state.reveal_finding("murmur"), "Duplicate finding must be a no-op.");
    assert!(state.reveal_finding("family_history"));
    assert_eq!(state.findings.len(), 2);
}
