// [tests/mirror/libs/domain/orders/parser_grammar.test.rs]
/**
 * =================================================================
 * APARATO: ORDER PARSER GRAMMAR CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-ORDERS
 * RESPONSABILIDAD: GRAMÁTICA DE TEXTO LIBRE -> ÓRDENES TIPADAS
 * =================================================================
 */

use codeblue_domain_models::extended::myocarditis::{FluidType, InductionAgent, InotropeDrug};
use codeblue_domain_orders::{
    parse_clarification_response, parse_multiple_orders, parse_order, OrderParams, ParsedOrderKind,
};

#[test]
fn certify_fluids_extraction_with_volume() {
    println!("\n🗣️ [PROVING_GROUNDS]: Auditing free-text order grammar...");

    let parsed = parse_order("give a 10 ml/kg normal saline bolus over 20 minutes");
    assert_eq!(parsed.kind, ParsedOrderKind::Fluids);
    assert!(!parsed.needs_clarification);

    let OrderParams::Fluids(fluids) = &parsed.params else { panic!("Fluids params expected") };
    assert_eq!(fluids.ml_per_kg, Some(10.0));
    assert_eq!(fluids.fluid_type, Some(FluidType::NormalSaline));
    assert_eq!(fluids.rate_minutes, Some(20.0));

    println!("   ✅ [SUCCESS]: Fluids grammar certified.");
}

#[test]
fn certify_fluids_without_volume_needs_clarification() {
    let parsed = parse_order("give her a saline bolus");
    assert_eq!(parsed.kind, ParsedOrderKind::Fluids);
    assert!(parsed.needs_clarification);
    assert!(parsed.clarification_question.as_deref().unwrap_or("").contains("mL"));
}

#[test]
fn certify_adenosine_beats_fluids_on_flush() {
    // El "flush" de la adenosina NO debe caer en la gramática de fluidos.
    let parsed = parse_order("adenosine 5 mg rapid push followed by a 10 ml flush");
    assert_eq!(parsed.kind, ParsedOrderKind::Adenosine);

    let OrderParams::Adenosine(adenosine) = &parsed.params else { panic!() };
    assert_eq!(adenosine.dose_milligrams, Some(5.0));
    assert!(adenosine.rapid_push);
    assert!(adenosine.flush_requested);
}

#[test]
fn certify_intubation_extraction() {
    let parsed = parse_order("let's intubate with ketamine, peep of 8 and fio2 60 with push-dose epi drawn");
    assert_eq!(parsed.kind, ParsedOrderKind::Intubation);

    let OrderParams::Intubation(intubation) = &parsed.params else { panic!() };
    assert_eq!(intubation.induction_agent, Some(InductionAgent::Ketamine));
    assert_eq!(intubation.peep_cm_h2o, Some(8.0));
    assert!((intubation.fio2_fraction.unwrap() - 0.6).abs() < 0.001);
    assert!(intubation.push_dose_epi_drawn);
}

#[test]
fn certify_intubation_without_agent_clarifies() {
    let parsed = parse_order("we need to intubate now");
    assert_eq!(parsed.kind, ParsedOrderKind::Intubation);
    assert!(parsed.needs_clarification);
    assert!(parsed
        .clarification_question
        .as_deref()
        .unwrap_or("")
        .contains("induction"));
}

#[test]
fn certify_epi_routes() {
    let drip = parse_order("start an epi drip at 0.05 mcg/kg/min");
    assert_eq!(drip.kind, ParsedOrderKind::EpiDrip);
    let OrderParams::Inotrope(inotrope) = &drip.params else { panic!() };
    assert_eq!(inotrope.drug, InotropeDrug::Epi);
    assert_eq!(inotrope.dose_mcg_kg_min, Some(0.05));

    let push = parse_order("draw up some push-dose epi");
    assert_eq!(push.kind, ParsedOrderKind::EpiPush);
}

#[test]
fn certify_diagnostics_and_consults() {
    assert_eq!(parse_order("get a 12-lead ekg").kind, ParsedOrderKind::Ecg);
    assert_eq!(parse_order("order a bedside echo").kind, ParsedOrderKind::Echo);
    assert_eq!(parse_order("portable chest x-ray please").kind, ParsedOrderKind::ChestXray);
    assert_eq!(parse_order("send an abg").kind, ParsedOrderKind::Abg);
    assert_eq!(parse_order("send a cbc and troponin").kind, ParsedOrderKind::Labs);
    assert_eq!(parse_order("call the picu").kind, ParsedOrderKind::ConsultPicu);
    assert_eq!(parse_order("get cardiology on the phone").kind, ParsedOrderKind::ConsultCardiology);
    assert_eq!(parse_order("activate ecmo").kind, ParsedOrderKind::ConsultEcmo);
    assert_eq!(parse_order("let's try a vagal maneuver").kind, ParsedOrderKind::VagalManeuver);
    assert_eq!(parse_order("synchronized cardioversion at 50 joules").kind, ParsedOrderKind::Cardioversion);
}

#[test]
fn certify_unknown_text_is_low_confidence() {
    let parsed = parse_order("the weather is nice today");
    assert_eq!(parsed.kind, ParsedOrderKind::Unknown);
    assert_eq!(parsed.confidence, codeblue_domain_orders::Confidence::Low);
}

#[test]
fn certify_compound_utterance_splits() {
    let orders = parse_multiple_orders("get an ekg and start an iv, also send labs");
    let kinds: Vec<_> = orders.iter().map(|order| order.kind).collect();
    assert!(kinds.contains(&ParsedOrderKind::Ecg));
    assert!(kinds.contains(&ParsedOrderKind::IvAccess));
    assert!(kinds.contains(&ParsedOrderKind::Labs));
}

#[test]
fn certify_clarification_response_merges() {
    let update = parse_clarification_response("make it 10 ml/kg", ParsedOrderKind::Fluids);
    let OrderParams::Fluids(fluids) = &update else { panic!() };
    assert_eq!(fluids.ml_per_kg, Some(10.0));

    let mut pending = parse_order("give her a saline bolus").params;
    pending.merge_clarification(update);
    let OrderParams::Fluids(merged) = &pending else { panic!() };
    assert_eq!(merged.ml_per_kg, Some(10.0));
    assert_eq!(merged.fluid_type, Some(FluidType::NormalSaline));
}
