// [tests/mirror/apps/gateway/order_lifecycle.test.rs]
/**
 * =================================================================
 * APARATO: ORDER LIFECYCLE CERTIFICATION (V4.0 - S4 GAUNTLET)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-GATEWAY
 * RESPONSABILIDAD: DEDUPE DE PENDIENTES Y FINALIZACIÓN PROGRAMADA
 * =================================================================
 */

use codeblue_domain_models::orders::{OrderKind, OrderStatus};
use codeblue_domain_models::wire::ClientRole;
use codeblue_gateway::config::GatewayConfig;
use codeblue_gateway::services::order_desk::handle_order;
use codeblue_gateway::state::{AppState, ClientHandle};
use codeblue_infra_store::StoreConfig;
use std::sync::Arc;
use std::time::Duration;
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

fn drain_frames(receiver: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(frame) = receiver.try_recv() {
        frames.push(frame);
    }
    frames
}

#[tokio::test(flavor = "multi_thread")]
async fn certify_duplicate_ekg_order_dedupe() {
    println!("\n📋 [PROVING_GROUNDS]: Running duplicate order gauntlet (S4)...");

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
    let (session, _newly) = app.registry.join("SIM_ORDERS_S4", handle, None).unwrap();

    // Dos órdenes de EKG con 100 ms de separación.
    handle_order(&app, &session, OrderKind::Ekg, None, Some("clinician-1".to_string())).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle_order(&app, &session, OrderKind::Ekg, None, Some("clinician-1".to_string())).await;

    // Exactamente UNA orden pendiente y la respuesta "still working".
    {
        let sim = session.sim.lock().await;
        let pending_count = sim
            .state
            .orders
            .iter()
            .filter(|order| order.kind == OrderKind::Ekg && order.status == OrderStatus::Pending)
            .count();
        assert_eq!(pending_count, 1, "L3_ORDER_FAULT: Exactly one pending EKG allowed.");
    }

    let frames = drain_frames(&mut frame_receiver);
    assert!(
        frames.iter().any(|frame| frame.contains("still working")),
        "Duplicate must answer with a 'still working' transcript delta."
    );

    // Tras la latencia, exactamente UNA orden completa con telemetría.
    tokio::time::sleep(Duration::from_millis(3_000)).await;

    {
        let sim = session.sim.lock().await;
        let ekg_orders: Vec<_> = sim
            .state
            .orders
            .iter()
            .filter(|order| order.kind == OrderKind::Ekg)
            .collect();
        assert_eq!(ekg_orders.len(), 1, "The duplicate must never create a second record.");
        assert_eq!(ekg_orders[0].status, OrderStatus::Complete);
        assert!(ekg_orders[0].result.is_some());
        assert!(sim.state.telemetry_enabled, "EKG completion must enable telemetry.");
        assert_eq!(sim.state.ekg_history.len(), 1);
        assert!(sim.pending_orders.is_empty());
    }

    println!("   ✅ [SUCCESS]: S4 dedupe lifecycle certified.");
}

#[tokio::test(flavor = "multi_thread")]
async fn certify_parallel_kinds_do_not_collide() {
    let app = AppState::new(Arc::new(test_config()), None);

    let (frame_sender, _frame_receiver) = mpsc::unbounded_channel();
    let handle = ClientHandle {
        user_id: "clinician-2".to_string(),
        role: ClientRole::Participant,
        display_name: None,
        character: None,
        connection_id: 2,
        sender: frame_sender,
    };
    let (session, _newly) = app.registry.join("SIM_ORDERS_MIX", handle, None).unwrap();

    // Tipos distintos conviven como pendientes sin dedupe cruzado.
    handle_order(&app, &session, OrderKind::Vitals, None, None).await;
    handle_order(&app, &session, OrderKind::CardiacExam, None, None).await;

    {
        let sim = session.sim.lock().await;
        assert_eq!(sim.pending_orders.len(), 2);
    }

    tokio::time::sleep(Duration::from_millis(2_500)).await;

    let sim = session.sim.lock().await;
    assert!(sim.pending_orders.is_empty());
    assert!(sim
        .state
        .orders
        .iter()
        .all(|order| order.status == OrderStatus::Complete));
}
