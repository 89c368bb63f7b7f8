// [tests/mirror/apps/gateway/myocarditis_overload.test.rs]
/**
 * =================================================================
 * APARATO: MYOCARDITIS FLUID OVERLOAD GAUNTLET (V4.0 - S2)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-GATEWAY
 * RESPONSABILIDAD: SOBRECARGA DE VOLUMEN -> EDEMA PULMONAR
 *
 * Guion certificado: paciente de 32 kg en el escenario de miocarditis;
 * tres bolos de 10 mL/kg en diez minutos suman 30 mL/kg, disparan la
 * regla de sobrecarga, sellan el edema pulmonar y castigan los vitales
 * SIN incurrir aún la penalización (reservada a > 60 mL/kg).
 * =================================================================
 */

use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_models::wire::ClientRole;
use codeblue_gateway::config::{now_ms, GatewayConfig};
use codeblue_gateway::services::dispatcher::{route_clinical_text, ConnectionContext};
use codeblue_gateway::sim::SimCore;
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

#[tokio::test]
async fn certify_three_boluses_trigger_pulmonary_edema() {
    println!("\n🌊 [PROVING_GROUNDS]: Running fluid overload gauntlet (S2)...");

    let app = AppState::new(Arc::new(test_config()), None);

    let (frame_sender, mut frame_receiver) = mpsc::unbounded_channel();
    let handle = ClientHandle {
        user_id: "clinician-1".to_string(),
        role: ClientRole::Participant,
        display_name: None,
        character: None,
        connection_id: 1,
        sender: frame_sender,
    };
    let (session, _newly) = app.registry.join("SIM_MYO_S2", handle, None).unwrap();
    let context = ConnectionContext {
        session: session.clone(),
        session_id: "SIM_MYO_S2".to_string(),
        user_id: "clinician-1".to_string(),
        role: ClientRole::Participant,
        connection_id: 1,
    };

    let (baseline_spo2, baseline_rr) = {
        let mut sim = session.sim.lock().await;
        *sim = SimCore::new("SIM_MYO_S2", ScenarioId::PedsMyocarditisSilentCrashV1, now_ms());
        (sim.state.vitals.oxygen_saturation, sim.state.vitals.respiratory_rate)
    };

    // Tres bolos de 10 mL/kg dentro de la ventana de diez minutos.
    for _ in 0..3 {
        route_clinical_text(&app, &context, "clinician-1", "give a 10 ml/kg normal saline bolus").await;
    }

    {
        let sim = session.sim.lock().await;
        let Some(ExtendedState::Myocarditis(myo)) = &sim.state.extended else {
            panic!("Myocarditis state expected")
        };

        assert!((myo.total_fluids_ml_kg - 30.0).abs() < 0.1, "Ledger must read 30 mL/kg.");
        assert_eq!(myo.fluids.len(), 3);
        assert!(myo.flags.pulmonary_edema, "Overload rule must seal pulmonary edema.");

        let overload_record = myo
            .rule_triggers
            .get("fluid_overload")
            .expect("fluid_overload must have fired");
        assert_eq!(overload_record.trigger_count, 1);

        // Delta de la regla aplicado: SpO2 -8, RR +10.
        assert!(
            sim.state.vitals.oxygen_saturation <= baseline_spo2 - 7.0,
            "SpO2 must drop by the rule delta."
        );
        assert!(
            sim.state.vitals.respiratory_rate >= baseline_rr + 9.0,
            "RR must climb by the rule delta."
        );

        // La penalización queda reservada al umbral de 60 mL/kg.
        assert!(
            !myo.scoring.penalties_incurred.iter().any(|penalty| penalty == "fluid_overload"),
            "Penalty must NOT apply at 30 mL/kg."
        );
    }

    // La línea crítica de la enfermera llegó a la sala.
    let mut nurse_warned = false;
    while let Ok(frame) = frame_receiver.try_recv() {
        if frame.contains("patient_transcript_delta") && frame.contains("wet") {
            nurse_warned = true;
        }
    }
    assert!(nurse_warned, "Critical nurse line must broadcast on overload.");

    println!("   ✅ [SUCCESS]: S2 overload arc certified.");
}

#[tokio::test]
async fn certify_penalty_beyond_sixty_ml_kg() {
    let app = AppState::new(Arc::new(test_config()), None);

    let (frame_sender, _frames) = mpsc::unbounded_channel();
    let handle = ClientHandle {
        user_id: "clinician-1".to_string(),
        role: ClientRole::Participant,
        display_name: None,
        character: None,
        connection_id: 1,
        sender: frame_sender,
    };
    let (session, _newly) = app.registry.join("SIM_MYO_60", handle, None).unwrap();
    let context = ConnectionContext {
        session: session.clone(),
        session_id: "SIM_MYO_60".to_string(),
        user_id: "clinician-1".to_string(),
        role: ClientRole::Participant,
        connection_id: 1,
    };

    {
        let mut sim = session.sim.lock().await;
        *sim = SimCore::new("SIM_MYO_60", ScenarioId::PedsMyocarditisSilentCrashV1, now_ms());
    }

    // Siete bolos de 10 mL/kg: 70 mL/kg, cruza el umbral de penalización.
    for _ in 0..7 {
        route_clinical_text(&app, &context, "clinician-1", "give a 10 ml/kg normal saline bolus").await;
    }

    let sim = session.sim.lock().await;
    let Some(ExtendedState::Myocarditis(myo)) = &sim.state.extended else { panic!() };
    assert!(myo.total_fluids_ml_kg > 60.0);
    assert!(
        myo.scoring.penalties_incurred.iter().any(|penalty| penalty == "fluid_overload"),
        "Beyond 60 mL/kg the penalty must be incurred."
    );
}
