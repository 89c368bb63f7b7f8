// [tests/mirror/libs/domain/orders/safety_validation.test.rs]
/**
 * =================================================================
 * APARATO: ORDER SAFETY CERTIFICATION (V2.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-ORDERS
 * RESPONSABILIDAD: ADVERTENCIAS DOCENTES SIN RECHAZO DE ÓRDENES
 * =================================================================
 */

use codeblue_domain_orders::{
    parse_order, validate_myocarditis_order, MyocarditisOrderContext,
};

#[test]
fn certify_fluid_overload_warning_over_forty() {
    let parsed = parse_order("give 20 ml/kg normal saline bolus");
    let context = MyocarditisOrderContext {
        shock_stage: 3,
        total_fluids_ml_kg: 30.0,
        has_epi_running: false,
        has_airway: false,
    };

    let assessment = validate_myocarditis_order(&parsed, &context);
    assert!(!assessment.is_valid);
    assert!(assessment.warnings.iter().any(|warning| warning.contains("40 mL/kg")));
    assert!(!assessment.teaching_points.is_empty());
}

#[test]
fn certify_cautious_bolus_passes_clean() {
    let parsed = parse_order("give 5 ml/kg normal saline bolus");
    let context = MyocarditisOrderContext {
        shock_stage: 1,
        total_fluids_ml_kg: 0.0,
        has_epi_running: false,
        has_airway: false,
    };

    let assessment = validate_myocarditis_order(&parsed, &context);
    assert!(assessment.is_valid);
    assert!(assessment.warnings.is_empty());
}

#[test]
fn certify_propofol_without_pressor_warns() {
    let parsed = parse_order("intubate with propofol");
    let context = MyocarditisOrderContext {
        shock_stage: 3,
        total_fluids_ml_kg: 10.0,
        has_epi_running: false,
        has_airway: false,
    };

    let assessment = validate_myocarditis_order(&parsed, &context);
    assert!(!assessment.is_valid);
    assert!(assessment.warnings.iter().any(|warning| warning.to_lowercase().contains("propofol")));
}

#[test]
fn certify_high_peep_in_deep_shock_warns() {
    let parsed = parse_order("intubate with ketamine and peep of 12");
    let context = MyocarditisOrderContext {
        shock_stage: 3,
        total_fluids_ml_kg: 10.0,
        has_epi_running: true,
        has_airway: false,
    };

    let assessment = validate_myocarditis_order(&parsed, &context);
    assert!(assessment.warnings.iter().any(|warning| warning.contains("PEEP")));
}

#[test]
fn certify_milrinone_without_pressor_warns() {
    let parsed = parse_order("start milrinone at 0.5 mcg/kg/min");
    let context = MyocarditisOrderContext {
        shock_stage: 2,
        total_fluids_ml_kg: 10.0,
        has_epi_running: false,
        has_airway: false,
    };

    let assessment = validate_myocarditis_order(&parsed, &context);
    assert!(assessment.warnings.iter().any(|warning| warning.contains("vasopressor")));

    // Con epinefrina corriendo, la advertencia desaparece.
    let covered_context = MyocarditisOrderContext { has_epi_running: true, ..context };
    let covered = validate_myocarditis_order(&parsed, &covered_context);
    assert!(covered.is_valid);
}
