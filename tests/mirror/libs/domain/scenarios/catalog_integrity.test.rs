// [tests/mirror/libs/domain/scenarios/catalog_integrity.test.rs]
/**
 * =================================================================
 * APARATO: SCENARIO CATALOG CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-SCENARIOS
 * RESPONSABILIDAD: CIERRE DEL GRAFO Y ALLOWLISTS DEL CATÁLOGO
 * =================================================================
 */

use codeblue_domain_models::intents::UNIVERSAL_INTENT_TYPES;
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_scenarios::{all_scenarios, scenario, validate_catalog};

#[test]
fn certify_full_catalog_closure() {
    println!("\n📚 [PROVING_GROUNDS]: Certifying scenario catalog closure...");
    validate_catalog().expect("CATALOG_FAULT: graph closure violated");
    println!("   ✅ [SUCCESS]: Every transition lands on a defined stage.");
}

#[test]
fn certify_allowlists_subset_of_universal_set() {
    for definition in all_scenarios() {
        for stage in &definition.stages {
            if let Some(allowlist) = &stage.allowed_intents {
                for intent in allowlist {
                    assert!(
                        UNIVERSAL_INTENT_TYPES.contains(&intent.as_str()),
                        "Stage '{}' of '{}' allows unknown intent '{}'",
                        stage.id,
                        definition.id.wire_label(),
                        intent
                    );
                }
            }
        }
    }
}

#[test]
fn certify_complex_scenarios_carry_engines() {
    let svt = scenario(ScenarioId::TeenSvtComplexV1);
    assert!(!svt.rules.is_empty(), "SVT scenario must carry physiology rules");
    assert!(svt.triggers.is_some(), "SVT scenario must carry trigger pools");
    assert!(svt.scoring.is_some(), "SVT scenario must carry scoring config");
    assert!((svt.patient.weight_kg - 50.0).abs() < 0.01);

    let myo = scenario(ScenarioId::PedsMyocarditisSilentCrashV1);
    assert!(myo.rules.iter().any(|rule| rule.id == "fluid_overload"));
    assert!((myo.patient.weight_kg - 32.0).abs() < 0.01);

    // Los escenarios simples NO cargan motores.
    let syncope = scenario(ScenarioId::Syncope);
    assert!(syncope.rules.is_empty());
    assert!(syncope.triggers.is_none());
}

#[test]
fn certify_svt_onset_arrives_at_two_minutes() {
    use codeblue_domain_scenarios::{TransitionTrigger, TransitionWhen};

    let svt = scenario(ScenarioId::TeenSvtComplexV1);
    let presentation = svt.stage("presentation").expect("presentation stage");

    let onset_transition = presentation
        .transitions
        .iter()
        .find(|transition| transition.to == "svt_onset")
        .expect("svt_onset transition");

    match &onset_transition.when {
        TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds }) => {
            assert!((*seconds - 120.0).abs() < 0.01);
        }
        other => panic!("Unexpected transition grammar: {other:?}"),
    }

    let onset = svt.stage("svt_onset").expect("svt_onset stage");
    assert!((onset.vitals.heart_rate - 220.0).abs() < 0.01);
    assert_eq!(onset.rhythm_summary, "SVT 220 bpm, narrow complex, regular");
}

#[test]
fn certify_stage_vitals_respect_floors() {
    for definition in all_scenarios() {
        for stage in &definition.stages {
            let pressure = stage.vitals.blood_pressure_pair();
            assert!(pressure.systolic >= 40.0, "SBP floor violated at '{}'", stage.id);
            assert!(pressure.diastolic >= 20.0, "DBP floor violated at '{}'", stage.id);
            assert!(stage.vitals.oxygen_saturation >= 50.0 && stage.vitals.oxygen_saturation <= 100.0);
        }
    }
}
