// [tests/mirror/libs/domain/physiology/rule_engine.test.rs]
/**
 * =================================================================
 * APARATO: RULE ENGINE PASS CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-PHYSIOLOGY
 * RESPONSABILIDAD: AGREGACIÓN, DIFERIDOS Y TOPES DEL MOTOR DE REGLAS
 * =================================================================
 */

use codeblue_domain_models::extended::myocarditis::{FluidBolus, FluidType, MyocarditisExtendedState};
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::{
    ConditionLogic, PhysiologyRule, Priority, RuleCondition, RuleEffect,
};
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_physiology::rules::run_rule_pass;

fn myo_state_with_fluids(ml_per_kg_each: f64, count: usize, now: i64) -> ExtendedState {
    let mut state = MyocarditisExtendedState::initial();
    state.phase_entered_at = now;
    for _ in 0..count {
        state.record_fluid_bolus(FluidBolus {
            ml_per_kg: ml_per_kg_each,
            total_ml: ml_per_kg_each * 32.0,
            fluid_type: FluidType::NormalSaline,
            rate_minutes: None,
            given_at: now,
        });
    }
    ExtendedState::Myocarditis(state)
}

fn fluid_overload_rule() -> PhysiologyRule {
    PhysiologyRule {
        id: "fluid_overload".to_string(),
        conditions: vec![RuleCondition::FluidsMlKgInWindow {
            threshold_ml_kg: 25.0,
            window_minutes: 10.0,
        }],
        condition_logic: ConditionLogic::All,
        effects: vec![
            RuleEffect::SetFlag { flag: "pulmonary_edema".to_string(), value: true },
            RuleEffect::VitalsDelta {
                delta: VitalsDelta {
                    oxygen_saturation: Some(-8.0),
                    respiratory_rate: Some(10.0),
                    ..VitalsDelta::default()
                },
            },
            RuleEffect::NurseLine { line: "Lungs sound wet.".to_string(), priority: Priority::Critical },
        ],
        delay_seconds: None,
        cooldown_seconds: Some(300.0),
        max_triggers: Some(2),
    }
}

#[test]
fn certify_fluid_overload_fires_and_aggregates() {
    println!("\n⚗️ [PROVING_GROUNDS]: Auditing fluid overload rule pass...");

    let now = 1_000_000;
    let mut extended = myo_state_with_fluids(10.0, 3, now);

    let outcome = run_rule_pass(&[fluid_overload_rule()], &mut extended, now);

    assert_eq!(outcome.triggered_rule_ids, vec!["fluid_overload".to_string()]);

    let delta = outcome.vitals_delta.expect("Aggregated vitals delta expected");
    assert_eq!(delta.oxygen_saturation, Some(-8.0));
    assert_eq!(delta.respiratory_rate, Some(10.0));

    let (line, priority) = outcome.nurse_line.expect("Critical nurse line expected");
    assert!(line.contains("wet"));
    assert_eq!(priority, Priority::Critical);

    let ExtendedState::Myocarditis(state) = &extended else { unreachable!() };
    assert!(state.flags.pulmonary_edema, "L2_RULE_FAULT: pulmonary_edema flag not sealed.");

    println!("   ✅ [SUCCESS]: Overload pass certified.");
}

#[test]
fn certify_below_threshold_never_fires() {
    let now = 1_000_000;
    // 20 mL/kg totales: por debajo del umbral de 25.
    let mut extended = myo_state_with_fluids(10.0, 2, now);

    let outcome = run_rule_pass(&[fluid_overload_rule()], &mut extended, now);
    assert!(outcome.triggered_rule_ids.is_empty());
    assert!(outcome.vitals_delta.is_none());
}

#[test]
fn certify_max_triggers_ceiling() {
    let now = 1_000_000;
    let mut extended = myo_state_with_fluids(10.0, 3, now);
    let rules = [fluid_overload_rule()];

    // Pases muy separados en el tiempo: el cooldown no protege, el tope sí.
    for pass_index in 0..5 {
        let pass_now = now + pass_index * 400_000;
        run_rule_pass(&rules, &mut extended, pass_now);
    }

    let ExtendedState::Myocarditis(state) = &extended else { unreachable!() };
    let record = state.rule_triggers.get("fluid_overload").expect("Trigger record expected");
    assert!(
        record.trigger_count <= 2,
        "L2_RULE_FAULT: max_triggers={} violated with count={}.",
        2,
        record.trigger_count
    );
}

#[test]
fn certify_delayed_effects_drain_on_schedule() {
    let now = 1_000_000;
    let mut extended = myo_state_with_fluids(10.0, 3, now);

    let delayed_rule = PhysiologyRule {
        delay_seconds: Some(10.0),
        ..fluid_overload_rule()
    };
    let rules = [delayed_rule];

    // Primer pase: la regla dispara pero sus efectos quedan encolados.
    let first_outcome = run_rule_pass(&rules, &mut extended, now);
    assert_eq!(first_outcome.triggered_rule_ids.len(), 1);
    assert!(first_outcome.vitals_delta.is_none(), "Delayed effect must not apply immediately");

    // Pase antes del vencimiento: nada drena.
    let early_outcome = run_rule_pass(&rules, &mut extended, now + 5_000);
    assert!(early_outcome.vitals_delta.is_none());

    // Pase tras el vencimiento: el delta drena completo.
    let due_outcome = run_rule_pass(&rules, &mut extended, now + 11_000);
    assert_eq!(
        due_outcome.vitals_delta.expect("Drained delta expected").oxygen_saturation,
        Some(-8.0)
    );
}

#[test]
fn certify_first_phase_advance_wins() {
    let now = 1_000_000;
    let mut extended = myo_state_with_fluids(10.0, 3, now);

    let competing_rules = vec![
        PhysiologyRule {
            id: "advance_a".to_string(),
            conditions: vec![RuleCondition::FluidsMlKgInWindow { threshold_ml_kg: 25.0, window_minutes: 10.0 }],
            condition_logic: ConditionLogic::All,
            effects: vec![RuleEffect::AdvancePhase { phase_id: "recognition".to_string() }],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        PhysiologyRule {
            id: "advance_b".to_string(),
            conditions: vec![RuleCondition::FluidsMlKgInWindow { threshold_ml_kg: 25.0, window_minutes: 10.0 }],
            condition_logic: ConditionLogic::All,
            effects: vec![RuleEffect::AdvancePhase { phase_id: "decompensation".to_string() }],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
    ];

    let outcome = run_rule_pass(&competing_rules, &mut extended, now);
    assert_eq!(
        outcome.phase_changed_to.as_deref(),
        Some("recognition"),
        "L2_RULE_FAULT: First phase advance must win; later ones drop this tick."
    );
}
