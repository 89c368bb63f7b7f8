// [tests/mirror/libs/domain/policy/tool_gate.test.rs]
/**
 * =================================================================
 * APARATO: TOOL GATE CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-POLICY
 * RESPONSABILIDAD: RATE LIMIT DE VITALES, COTAS Y ALLOWLIST
 * =================================================================
 */

use codeblue_domain_models::intents::IntentRequest;
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_policy::{GateVerdict, ToolGate};

fn vitals_request(heart_rate_delta: f64) -> IntentRequest {
    IntentRequest {
        intent_type: "intent_updateVitals".to_string(),
        delta: Some(VitalsDelta { heart_rate: Some(heart_rate_delta), ..VitalsDelta::default() }),
        ..IntentRequest::default()
    }
}

#[test]
fn certify_vitals_rate_limit_window() {
    println!("\n🛡️ [PROVING_GROUNDS]: Auditing vitals rate limit (1 per 10 s)...");

    let mut gate = ToolGate::new();
    let t0 = 1_000_000;

    // t=0: admitido.
    assert!(gate.validate(None, &vitals_request(-20.0), t0).is_allowed());

    // t=+5 s: rechazado con la razón sellada.
    match gate.validate(None, &vitals_request(-10.0), t0 + 5_000) {
        GateVerdict::Rejected { reason } => assert_eq!(reason, "vitals_rate_limited"),
        other => panic!("Expected rejection, got {other:?}"),
    }

    // t=+11 s: la ventana venció, admitido de nuevo.
    assert!(gate.validate(None, &vitals_request(-10.0), t0 + 11_000).is_allowed());

    println!("   ✅ [SUCCESS]: Rate window certified.");
}

#[test]
fn certify_rejection_does_not_consume_window() {
    let mut gate = ToolGate::new();
    let t0 = 1_000_000;

    assert!(gate.validate(None, &vitals_request(-20.0), t0).is_allowed());
    // Rechazo a los 5 s: NO debe correr el sello temporal.
    let _ = gate.validate(None, &vitals_request(-10.0), t0 + 5_000);
    // A los 10.5 s del primero, la ventana venció aunque hubo un rechazo.
    assert!(gate.validate(None, &vitals_request(-10.0), t0 + 10_500).is_allowed());
}

#[test]
fn certify_widened_bounds() {
    let mut gate = ToolGate::new();

    // HR delta -30 cae dentro de [20-50, 240+50] = [-30, 290].
    assert!(gate.validate(None, &vitals_request(-30.0), 0).is_allowed());

    // HR delta -31 viola la cota ensanchada.
    let mut rejecting_gate = ToolGate::new();
    match rejecting_gate.validate(None, &vitals_request(-31.0), 0) {
        GateVerdict::Rejected { reason } => assert_eq!(reason, "invalid_vitals_delta"),
        other => panic!("Expected bounds rejection, got {other:?}"),
    }
}

#[test]
fn certify_stage_allowlist_enforcement() {
    let mut gate = ToolGate::new();
    let allowlist = vec!["intent_revealFinding".to_string()];

    match gate.validate(Some(&allowlist), &vitals_request(-10.0), 0) {
        GateVerdict::Rejected { reason } => assert_eq!(reason, "intent_not_allowed_in_stage"),
        other => panic!("Expected allowlist rejection, got {other:?}"),
    }
}

#[test]
fn certify_field_requirements() {
    let mut gate = ToolGate::new();

    let missing_stage = IntentRequest {
        intent_type: "intent_advanceStage".to_string(),
        ..IntentRequest::default()
    };
    match gate.validate(None, &missing_stage, 0) {
        GateVerdict::Rejected { reason } => assert_eq!(reason, "missing_stage"),
        other => panic!("{other:?}"),
    }

    let empty_finding = IntentRequest {
        intent_type: "intent_revealFinding".to_string(),
        finding_id: Some("  ".to_string()),
        ..IntentRequest::default()
    };
    match gate.validate(None, &empty_finding, 0) {
        GateVerdict::Rejected { reason } => assert_eq!(reason, "invalid_finding"),
        other => panic!("{other:?}"),
    }

    let unknown = IntentRequest {
        intent_type: "intent_timeTravel".to_string(),
        ..IntentRequest::default()
    };
    match gate.validate(None, &unknown, 0) {
        GateVerdict::Rejected { reason } => assert_eq!(reason, "unknown_intent"),
        other => panic!("{other:?}"),
    }
}
