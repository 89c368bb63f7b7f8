// [tests/mirror/libs/domain/models/wire_validation.test.rs]
/**
 * =================================================================
 * APARATO: WIRE VALIDATION CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MODELS
 * RESPONSABILIDAD: FRONTERA DE VALIDACIÓN DE TRAMAS ENTRANTES
 * =================================================================
 */

use codeblue_domain_models::wire::{parse_inbound, InboundMessage, WireError};

const CEILING: usize = 262_144;

#[test]
fn certify_join_frame_roundtrip() {
    println!("\n📡 [PROVING_GROUNDS]: Auditing inbound frame grammar...");

    let raw_frame = r#"{
        "type": "join",
        "session_id": "SIM_ROOM_7",
        "user_id": "clinician-1",
        "role": "participant",
        "display_name": "Dr. Osei"
    }"#;

    let parsed = parse_inbound(raw_frame, CEILING).expect("Valid join must parse");
    let InboundMessage::Join { session_id, role, .. } = &parsed else { panic!("Join expected") };
    assert_eq!(session_id, "SIM_ROOM_7");
    assert_eq!(format!("{role:?}"), "Participant");

    // Validar -> serializar -> re-validar produce la misma trama.
    let re_serialized = serde_json::to_string(&parsed).unwrap();
    let re_parsed = parse_inbound(&re_serialized, CEILING).expect("Round-trip must re-validate");
    assert_eq!(
        serde_json::to_value(&parsed).unwrap(),
        serde_json::to_value(&re_parsed).unwrap()
    );

    println!("   ✅ [SUCCESS]: Join grammar certified.");
}

#[test]
fn certify_session_id_grammar_rejection() {
    let raw_frame = r#"{"type":"join","session_id":"x!","user_id":"u1","role":"presenter"}"#;
    assert!(matches!(
        parse_inbound(raw_frame, CEILING),
        Err(WireError::InvalidSessionId)
    ));
}

#[test]
fn certify_frame_ceiling_rejection() {
    let padding = "x".repeat(CEILING + 1);
    let oversized = format!(r#"{{"type":"ping","session_id":"{padding}"}}"#);
    assert!(matches!(
        parse_inbound(&oversized, CEILING),
        Err(WireError::FrameTooLarge { .. })
    ));
}

#[test]
fn certify_unknown_scenario_rejection() {
    let raw_frame = r#"{"type":"set_scenario","session_id":"SIM_ROOM_7","user_id":"u1","scenario_id":"zombie_apocalypse"}"#;
    assert!(matches!(
        parse_inbound(raw_frame, CEILING),
        Err(WireError::UnknownScenario(_))
    ));
}

#[test]
fn certify_empty_user_rejection() {
    let raw_frame = r#"{"type":"start_speaking","session_id":"SIM_ROOM_7","user_id":"  "}"#;
    assert!(matches!(
        parse_inbound(raw_frame, CEILING),
        Err(WireError::EmptyField("user_id"))
    ));
}

#[test]
fn certify_voice_command_grammar() {
    let raw_frame = r#"{
        "type": "voice_command",
        "session_id": "SIM_ROOM_7",
        "user_id": "presenter-1",
        "command_type": "toggle_telemetry"
    }"#;
    let parsed = parse_inbound(raw_frame, CEILING).expect("Command must parse");
    assert!(matches!(parsed, InboundMessage::VoiceCommand { .. }));

    let malformed = r#"{"type":"voice_command","session_id":"SIM_ROOM_7","user_id":"p1","command_type":"warp_speed"}"#;
    assert!(matches!(
        parse_inbound(malformed, CEILING),
        Err(WireError::MalformedFrame(_))
    ));
}
