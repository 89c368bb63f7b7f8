// [tests/mirror/libs/domain/physiology/rule_cooldown_property.test.rs]
/**
 * =================================================================
 * APARATO: RULE COOLDOWN PROPERTY GAUNTLET (V2.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-PHYSIOLOGY
 * RESPONSABILIDAD: PROPIEDADES UNIVERSALES DEL MOTOR DE REGLAS
 *
 * Propiedades certificadas sobre secuencias arbitrarias de pases:
 * 1. Una regla en cooldown JAMÁS re-dispara dentro de su ventana.
 * 2. Historias de fluidos con total <= 20 mL/kg jamás disparan
 *    'fluid_overload'.
 * =================================================================
 */

use codeblue_domain_models::extended::myocarditis::{FluidBolus, FluidType, MyocarditisExtendedState};
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::{ConditionLogic, PhysiologyRule, RuleCondition, RuleEffect};
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_physiology::rules::run_rule_pass;
use proptest::prelude::*;

fn always_true_rule(cooldown_seconds: f64) -> PhysiologyRule {
    PhysiologyRule {
        id: "cooldown_probe".to_string(),
        // Estadio de shock >= 1 es verdadero desde la ignición.
        conditions: vec![RuleCondition::ShockStageGte { stage: 1 }],
        condition_logic: ConditionLogic::All,
        effects: vec![RuleEffect::VitalsDelta {
            delta: VitalsDelta { heart_rate: Some(1.0), ..VitalsDelta::default() },
        }],
        delay_seconds: None,
        cooldown_seconds: Some(cooldown_seconds),
        max_triggers: None,
    }
}

fn fluid_overload_rule() -> PhysiologyRule {
    PhysiologyRule {
        id: "fluid_overload".to_string(),
        conditions: vec![RuleCondition::FluidsMlKgInWindow {
            threshold_ml_kg: 25.0,
            window_minutes: 10.0,
        }],
        condition_logic: ConditionLogic::All,
        effects: vec![RuleEffect::SetFlag { flag: "pulmonary_edema".to_string(), value: true }],
        delay_seconds: None,
        cooldown_seconds: None,
        max_triggers: None,
    }
}

proptest! {
    /// Para toda secuencia de instantes crecientes, los disparos de una
    /// regla con cooldown C respetan una separación mínima de C.
    #[test]
    fn cooldown_window_never_violated(
        cooldown_s in 5.0f64..120.0,
        gaps_ms in proptest::collection::vec(100i64..30_000, 1..40)
    ) {
        let mut extended = ExtendedState::Myocarditis(MyocarditisExtendedState::initial());
        let rules = [always_true_rule(cooldown_s)];

        let mut now = 1_000_000i64;
        let mut fire_instants: Vec<i64> = Vec::new();

        for gap in gaps_ms {
            now += gap;
            let outcome = run_rule_pass(&rules, &mut extended, now);
            if !outcome.triggered_rule_ids.is_empty() {
                fire_instants.push(now);
            }
        }

        let cooldown_ms = (cooldown_s * 1000.0) as i64;
        for pair in fire_instants.windows(2) {
            prop_assert!(
                pair[1] - pair[0] >= cooldown_ms,
                "Cooldown violated: fires at {} and {} with window {}",
                pair[0], pair[1], cooldown_ms
            );
        }
    }

    /// Para toda historia de fluidos con total <= 20 mL/kg, la regla de
    /// sobrecarga jamás dispara, sin importar el fraccionamiento.
    #[test]
    fn fluid_overload_never_fires_below_twenty(
        bolus_fractions in proptest::collection::vec(0.5f64..1.0, 1..10)
    ) {
        let fraction_sum: f64 = bolus_fractions.iter().sum();
        let scale = 20.0 / fraction_sum.max(1.0);

        let mut state = MyocarditisExtendedState::initial();
        let now = 1_000_000i64;
        for (index, fraction) in bolus_fractions.iter().enumerate() {
            let ml_per_kg = fraction * scale;
            state.record_fluid_bolus(FluidBolus {
                ml_per_kg,
                total_ml: ml_per_kg * 32.0,
                fluid_type: FluidType::NormalSaline,
                rate_minutes: None,
                given_at: now + index as i64 * 1_000,
            });
        }
        prop_assume!(state.total_fluids_ml_kg <= 20.0 + 1e-9);

        let mut extended = ExtendedState::Myocarditis(state);
        let outcome = run_rule_pass(&[fluid_overload_rule()], &mut extended, now + 60_000);

        prop_assert!(
            outcome.triggered_rule_ids.is_empty(),
            "fluid_overload fired with only {} mL/kg",
            match &extended { ExtendedState::Myocarditis(s) => s.total_fluids_ml_kg, _ => 0.0 }
        );
    }

    /// El invariante contable del ledger: la suma del vector coincide con
    /// el total sellado dentro de 0.1 mL/kg.
    #[test]
    fn fluid_ledger_sum_invariant(
        boluses in proptest::collection::vec(1.0f64..20.0, 0..15)
    ) {
        let mut state = MyocarditisExtendedState::initial();
        for (index, ml_per_kg) in boluses.iter().enumerate() {
            state.record_fluid_bolus(FluidBolus {
                ml_per_kg: *ml_per_kg,
                total_ml: ml_per_kg * 32.0,
                fluid_type: FluidType::LactatedRingers,
                rate_minutes: None,
                given_at: index as i64 * 1_000,
            });
        }

        let vector_sum: f64 = state.fluids.iter().map(|bolus| bolus.ml_per_kg).sum();
        prop_assert!((state.total_fluids_ml_kg - vector_sum).abs() < 0.1);
    }
}
