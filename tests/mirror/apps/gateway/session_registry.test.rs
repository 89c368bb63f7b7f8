// [tests/mirror/apps/gateway/session_registry.test.rs]
/**
 * =================================================================
 * APARATO: SESSION REGISTRY CERTIFICATION (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-GATEWAY
 * RESPONSABILIDAD: JOIN IDEMPOTENTE, TECHO DE SALA Y RECOLECCIÓN
 * =================================================================
 */

use codeblue_domain_models::wire::ClientRole;
use codeblue_gateway::config::GatewayConfig;
use codeblue_gateway::state::{AppState, ClientHandle, JoinError};
use codeblue_infra_store::StoreConfig;
use std::sync::Arc;
use tokio::sync::mpsc;

fn test_config(ceiling: usize, grace_ms: i64) -> GatewayConfig {
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
        session_client_ceiling: ceiling,
        session_grace_ms: grace_ms,
        store: StoreConfig::default(),
        chaos_latency_ms: 0,
        chaos_drop_percentage: 0.0,
    }
}

fn probe_handle(
    user_id: &str,
    role: ClientRole,
    connection_id: u64,
) -> (ClientHandle, mpsc::UnboundedReceiver<String>) {
    let (frame_sender, frame_receiver) = mpsc::unbounded_channel();
    (
        ClientHandle {
            user_id: user_id.to_string(),
            role,
            display_name: None,
            character: None,
            connection_id,
            sender: frame_sender,
        },
        frame_receiver,
    )
}

#[tokio::test]
async fn certify_idempotent_join_replaces_prior_handle() {
    println!("\n🤝 [PROVING_GROUNDS]: Auditing idempotent join semantics...");

    let app = AppState::new(Arc::new(test_config(24, 120_000)), None);

    let (first_handle, mut first_receiver) = probe_handle("clinician-1", ClientRole::Participant, 1);
    let (session, newly_created) = app.registry.join("SIM_REG_1", first_handle, None).unwrap();
    assert!(newly_created, "First join must birth the session.");

    // Re-join del MISMO usuario: reemplaza, no duplica.
    let (second_handle, _second_receiver) = probe_handle("clinician-1", ClientRole::Participant, 2);
    let (_same_session, newly_created_again) =
        app.registry.join("SIM_REG_1", second_handle, None).unwrap();
    assert!(!newly_created_again);
    assert_eq!(session.client_count(), 1, "Idempotent join must not duplicate handles.");

    // El handle previo fue despedido con una razón explicativa.
    let farewell = first_receiver.try_recv().expect("Prior handle must receive a farewell");
    assert!(farewell.contains("replaced"));

    println!("   ✅ [SUCCESS]: Idempotent join certified.");
}

#[tokio::test]
async fn certify_invalid_session_grammar_rejected() {
    let app = AppState::new(Arc::new(test_config(24, 120_000)), None);

    let (handle, _receiver) = probe_handle("clinician-1", ClientRole::Participant, 1);
    let join_fault = app.registry.join("x!", handle, None).unwrap_err();
    assert_eq!(join_fault, JoinError::InvalidSession);
}

#[tokio::test]
async fn certify_session_ceiling_enforced() {
    let app = AppState::new(Arc::new(test_config(1, 120_000)), None);

    let (first_handle, _first_receiver) = probe_handle("clinician-1", ClientRole::Participant, 1);
    app.registry.join("SIM_REG_FULL", first_handle, None).unwrap();

    let (second_handle, _second_receiver) = probe_handle("clinician-2", ClientRole::Participant, 2);
    let join_fault = app.registry.join("SIM_REG_FULL", second_handle, None).unwrap_err();
    assert_eq!(join_fault, JoinError::SessionFull);

    // El MISMO usuario sí puede re-entrar (reemplazo, no alta nueva).
    let (rejoin_handle, _rejoin_receiver) = probe_handle("clinician-1", ClientRole::Participant, 3);
    assert!(app.registry.join("SIM_REG_FULL", rejoin_handle, None).is_ok());
}

#[tokio::test]
async fn certify_stale_leave_does_not_evict_replacement() {
    let app = AppState::new(Arc::new(test_config(24, 120_000)), None);

    let (first_handle, _first_receiver) = probe_handle("clinician-1", ClientRole::Participant, 1);
    let (session, _newly) = app.registry.join("SIM_REG_2", first_handle, None).unwrap();

    let (second_handle, _second_receiver) = probe_handle("clinician-1", ClientRole::Participant, 2);
    app.registry.join("SIM_REG_2", second_handle, None).unwrap();

    // El desconecte TARDÍO de la conexión vieja no debe tumbar la nueva.
    app.registry.leave("SIM_REG_2", "clinician-1", 1);
    assert_eq!(session.client_count(), 1, "Stale leave must not evict the replacement handle.");

    // El desconecte de la conexión vigente sí libera la sala.
    app.registry.leave("SIM_REG_2", "clinician-1", 2);
    assert_eq!(session.client_count(), 0);
}

#[tokio::test]
async fn certify_reaper_collectability_gating() {
    let app = AppState::new(Arc::new(test_config(24, 0)), None);

    let (handle, _receiver) = probe_handle("clinician-1", ClientRole::Participant, 1);
    let (session, _newly) = app.registry.join("SIM_REG_3", handle, None).unwrap();

    // Con un cliente conectado jamás es recolectable.
    assert!(!session.is_collectable(0).await);

    app.registry.leave("SIM_REG_3", "clinician-1", 1);

    // Sin clientes, sin órdenes pendientes y gracia vencida: recolectable.
    assert!(session.is_collectable(0).await);

    app.registry.remove("SIM_REG_3");
    assert!(app.registry.get("SIM_REG_3").is_none());
}

#[tokio::test]
async fn certify_broadcast_reaps_broken_handles() {
    let app = AppState::new(Arc::new(test_config(24, 120_000)), None);

    let (healthy_handle, mut healthy_receiver) = probe_handle("clinician-1", ClientRole::Participant, 1);
    let (session, _newly) = app.registry.join("SIM_REG_4", healthy_handle, None).unwrap();

    // Un segundo cliente cuyo receptor se descarta (enlace roto).
    let (broken_handle, broken_receiver) = probe_handle("clinician-2", ClientRole::Participant, 2);
    app.registry.join("SIM_REG_4", broken_handle, None).unwrap();
    drop(broken_receiver);

    session.broadcast(&codeblue_domain_models::wire::OutboundMessage::Pong);

    // El enlace roto fue recogido; el sano recibió su trama.
    assert_eq!(session.client_count(), 1);
    assert!(healthy_receiver.try_recv().is_ok());
}
