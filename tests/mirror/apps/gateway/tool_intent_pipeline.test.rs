// [tests/mirror/apps/gateway/tool_intent_pipeline.test.rs]
/**
 * =================================================================
 * APARATO: TOOL INTENT PIPELINE GAUNTLET (V3.0 - S3)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-GATEWAY
 * RESPONSABILIDAD: RATE LIMIT DE VITALES DE EXTREMO A EXTREMO
 * =================================================================
 */

use codeblue_domain_models::intents::IntentRequest;
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_models::wire::ClientRole;
use codeblue_gateway::config::GatewayConfig;
use codeblue_gateway::services::tool_intent::handle_intent;
use codeblue_gateway::state::{AppState, ClientHandle};
use codeblue_infra_store::StoreConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

fn test_config() -> GatewayConfig {
    GatewayConfig {
        listen_port: 0,
        allow_insecure_voice_ws: true,
        heartbeat_interval_ms: 3_600_000,
        command_cooldown_ms: 0,
        max_ws_payload_bytes: 262_144,
        soft_budget_usd: 1.0,
        hard_budget_usd: 2.0,
        usd_per_token: 0.00001,
        realtime_model: "gpt-4o-realtime-preview".to_string(),
        openai_api_key: None,
        is_production: false,
        session_client_ceiling: 24,
        session_grace_ms: 120_000,
        store: StoreConfig::default(),
        chaos_latency_ms: 0,
        chaos_drop_percentage: 0.0,
    }
}

fn vitals_intent(delta_hr: f64) -> IntentRequest {
    IntentRequest {
        intent_type: "intent_updateVitals".to_string(),
        delta: Some(VitalsDelta { heart_rate: Some(delta_hr), ..VitalsDelta::default() }),
        ..IntentRequest::default()
    }
}

#[tokio::test]
async fn certify_second_vitals_intent_rate_limited() {
    println!("\n🛡️ [PROVING_GROUNDS]: Running vitals rate limit gauntlet (S3)...");

    let app = AppState::new(Arc::new(test_config()), None);

    let (frame_sender, mut frame_receiver) = mpsc::unbounded_channel();
    let handle = ClientHandle {
        user_id: "presenter-1".to_string(),
        role: ClientRole::Presenter,
        display_name: None,
        character: None,
        connection_id: 1,
        sender: frame_sender,
    };
    let (session, _newly) = app.registry.join("SIM_GATE_S3", handle, None).unwrap();

    let baseline_heart_rate = {
        let sim = session.sim.lock().await;
        sim.state.vitals.heart_rate
    };

    // t=0: primer intent admitido y aplicado.
    handle_intent(&app, &session, vitals_intent(-20.0), "realtime").await;
    let after_first = {
        let sim = session.sim.lock().await;
        sim.state.vitals.heart_rate
    };
    assert!(
        (after_first - (baseline_heart_rate - 20.0)).abs() < 0.01,
        "First intent must integrate the delta."
    );

    // t=+5 s (dentro de la ventana): segundo intent rechazado.
    handle_intent(&app, &session, vitals_intent(-20.0), "realtime").await;
    let after_second = {
        let sim = session.sim.lock().await;
        sim.state.vitals.heart_rate
    };
    assert!(
        (after_second - after_first).abs() < 0.01,
        "Rejected intent must leave the state untouched."
    );

    // Los presentadores reciben el error de política.
    let mut rejection_seen = false;
    while let Ok(frame) = frame_receiver.try_recv() {
        if frame.contains("vitals_rate_limited") {
            rejection_seen = true;
        }
    }
    assert!(rejection_seen, "Presenter must receive the rejection reason.");

    println!("   ✅ [SUCCESS]: S3 rate limit pipeline certified.");
}

#[tokio::test]
async fn certify_reveal_finding_applies_once() {
    let app = AppState::new(Arc::new(test_config()), None);

    let (frame_sender, _frames) = mpsc::unbounded_channel();
    let handle = ClientHandle {
        user_id: "presenter-1".to_string(),
        role: ClientRole::Presenter,
        display_name: None,
        character: None,
        connection_id: 1,
        sender: frame_sender,
    };
    let (session, _newly) = app.registry.join("SIM_GATE_FIND", handle, None).unwrap();

    let reveal = IntentRequest {
        intent_type: "intent_revealFinding".to_string(),
        finding_id: Some("systolic_murmur".to_string()),
        ..IntentRequest::default()
    };

    handle_intent(&app, &session, reveal.clone(), "realtime").await;
    handle_intent(&app, &session, reveal, "realtime").await;

    let sim = session.sim.lock().await;
    assert_eq!(
        sim.state.findings,
        vec!["systolic_murmur".to_string()],
        "Reveal must have set semantics."
    );
}
