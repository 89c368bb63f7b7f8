// [tests/mirror/apps/gateway/engine_drift.test.rs]
/**
 * =================================================================
 * APARATO: ENGINE DRIFT CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-GATEWAY
 * RESPONSABILIDAD: INTEGRACIÓN LINEAL DE DERIVA Y RECUPERACIÓN DE TICKS
 * =================================================================
 */

use codeblue_domain_models::state::{ScenarioId, StatePatch};
use codeblue_gateway::sim::SimCore;

#[test]
fn certify_drift_integration_over_one_minute() {
    println!("\n📈 [PROVING_GROUNDS]: Auditing stage drift integration...");

    let t0 = 1_000_000;
    let mut sim = SimCore::new("SIM_DRIFT_1", ScenarioId::Syncope, t0);
    sim.set_stage("orthostatic_challenge", t0).expect("Stage exists");

    let baseline = sim.state.vitals.clone();
    let baseline_pressure = baseline.blood_pressure_pair();

    // Un minuto sin ticks: el siguiente pase recupera el delta entero.
    let outcome = sim.tick(t0 + 60_000);
    assert!(outcome.changed);

    // Deriva del estadio: HR +2/min, SBP -2/min.
    assert!((sim.state.vitals.heart_rate - (baseline.heart_rate + 2.0)).abs() < 0.01);
    let pressure = sim.state.vitals.blood_pressure_pair();
    assert!((pressure.systolic - (baseline_pressure.systolic - 2.0)).abs() < 1.0);

    println!("   ✅ [SUCCESS]: Lost-tick recovery certified.");
}

#[test]
fn certify_drift_linearity_split_vs_whole() {
    let t0 = 1_000_000;

    // Integrar 60 s en un pase...
    let mut whole = SimCore::new("SIM_DRIFT_W", ScenarioId::Syncope, t0);
    whole.set_stage("orthostatic_challenge", t0).unwrap();
    whole.tick(t0 + 60_000);

    // ...o en cuatro pases de 15 s produce la misma frecuencia.
    let mut split = SimCore::new("SIM_DRIFT_S", ScenarioId::Syncope, t0);
    split.set_stage("orthostatic_challenge", t0).unwrap();
    for quarter in 1..=4 {
        split.tick(t0 + quarter * 15_000);
    }

    assert!(
        (whole.state.vitals.heart_rate - split.state.vitals.heart_rate).abs() < 0.01,
        "L3_ENGINE_FAULT: Drift integration must be linear in elapsed time."
    );
}

#[test]
fn certify_time_elapsed_transition() {
    let t0 = 1_000_000;
    let mut sim = SimCore::new("SIM_DRIFT_T", ScenarioId::PalpitationsSvt, t0);
    assert_eq!(sim.state.stage_id, "intake");

    // A los 119 s no hay transición; a los 121 s pivota a 'svt_run'.
    sim.tick(t0 + 119_000);
    assert_eq!(sim.state.stage_id, "intake");

    let outcome = sim.tick(t0 + 121_000);
    assert_eq!(sim.state.stage_id, "svt_run");
    assert_eq!(outcome.stage_changed_to.as_deref(), Some("svt_run"));
    assert!((sim.state.vitals.heart_rate - 225.0).abs() < 0.01);
}

#[test]
fn certify_action_driven_transition() {
    use codeblue_domain_scenarios::ACTION_STAND_TEST;

    let t0 = 1_000_000;
    let mut sim = SimCore::new("SIM_DRIFT_A", ScenarioId::Syncope, t0);

    sim.record_action(ACTION_STAND_TEST);
    sim.tick(t0 + 1_000);

    assert_eq!(
        sim.state.stage_id, "orthostatic_challenge",
        "Stand test action must drive the transition."
    );
}

#[test]
fn certify_engine_hydration_identity() {
    let t0 = 1_000_000;
    let mut sim = SimCore::new("SIM_DRIFT_H", ScenarioId::TeenSvtComplexV1, t0);
    sim.set_stage("svt_onset", t0 + 5_000).expect("Stage exists");

    let snapshot = sim.get_state();
    let mut twin = SimCore::new("SIM_DRIFT_H", ScenarioId::TeenSvtComplexV1, t0);
    twin.hydrate(StatePatch::from(&snapshot));

    assert_eq!(twin.get_state(), snapshot, "hydrate(get_state()) must be the identity.");
}

#[test]
fn certify_rhythm_override_and_clocks() {
    let t0 = 1_000_000;
    let mut sim = SimCore::new("SIM_DRIFT_O", ScenarioId::Syncope, t0);

    // Override clínico explícito con anotación.
    sim.set_rhythm("Junctional escape rhythm", Some("post-adenosine pause"));
    assert_eq!(
        sim.state.rhythm_summary,
        "Junctional escape rhythm (post-adenosine pause)"
    );

    // Relojes del motor: segundos de escenario y de estadio.
    assert!((sim.elapsed_seconds(t0 + 90_000) - 90.0).abs() < 0.01);
    assert!((sim.stage_elapsed_seconds(t0 + 30_000) - 30.0).abs() < 0.01);
}

#[test]
fn certify_rhythm_label_follows_vitals_adjustment() {
    use codeblue_domain_models::vitals::VitalsDelta;

    let t0 = 1_000_000;
    let mut sim = SimCore::new("SIM_DRIFT_R", ScenarioId::TeenSvtComplexV1, t0);
    assert!(sim.state.rhythm_summary.contains("Sinus tachycardia"));

    // Ajuste hacia 220: la etiqueta PALS pivota a SVT.
    sim.apply_vitals_adjustment(&VitalsDelta { heart_rate: Some(85.0), ..VitalsDelta::default() });
    assert!(
        sim.state.rhythm_summary.contains("SVT"),
        "Label must resynthesize after vitals adjustments (got '{}').",
        sim.state.rhythm_summary
    );
}
