// [tests/mirror/libs/domain/budget/budget_limits.test.rs]
/**
 * =================================================================
 * APARATO: COST GOVERNOR CERTIFICATION (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-BUDGET
 * RESPONSABILIDAD: UMBRALES BLANDO/DURO Y SELLO DEL LÍMITE DURO
 * =================================================================
 */

use codeblue_domain_budget::{CostGovernor, CostGovernorConfig, UsageDelta};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn governor(soft: f64, hard: f64, usd_per_token: f64) -> CostGovernor {
    CostGovernor::new(CostGovernorConfig {
        usd_per_token,
        soft_limit_usd: soft,
        hard_limit_usd: hard,
        on_soft_limit: None,
        on_hard_limit: None,
        on_soft_reset: None,
        chaos_latency_ms: 0,
        chaos_drop_percentage: 0.0,
    })
}

#[test]
fn certify_hard_limit_sequence() {
    println!("\n💸 [PROVING_GROUNDS]: Auditing budget threshold cascade...");

    // soft=0.5, hard=0.7; 800 tokens * 0.001 = 0.8 USD cruza ambos.
    let mut cost = governor(0.5, 0.7, 0.001);
    cost.add_usage(UsageDelta { input_tokens: Some(800), output_tokens: Some(0) });

    assert!(cost.is_throttled(), "L2_BUDGET_FAULT: soft ceiling must throttle.");
    assert!(cost.is_fallback(), "L2_BUDGET_FAULT: hard ceiling must latch fallback.");
    assert!(cost.is_hard_limit_hit());

    // El reset blando NO limpia nada con el límite duro sellado.
    cost.reset_soft_limit();
    assert!(cost.is_throttled(), "Soft reset after hard trip must be a no-op.");

    // El reset completo cera contadores pero el fallback sigue sellado.
    cost.reset();
    assert_eq!(cost.ledger().input_tokens, 0);
    assert_eq!(cost.ledger().usd_estimate, 0.0);
    assert!(cost.is_fallback(), "Hard latch survives reset() for the governor's lifetime.");

    println!("   ✅ [SUCCESS]: Threshold cascade certified.");
}

#[test]
fn certify_soft_only_reset_is_idempotent() {
    let mut cost = governor(0.5, 10.0, 0.001);
    cost.add_usage(UsageDelta { input_tokens: Some(600), output_tokens: None });

    assert!(cost.is_throttled());
    assert!(!cost.is_fallback());

    cost.reset_soft_limit();
    assert!(!cost.is_throttled());

    // Idempotencia: llamadas repetidas no cambian nada.
    cost.reset_soft_limit();
    cost.reset_soft_limit();
    assert!(!cost.is_throttled());
    assert!(!cost.is_fallback());
}

#[test]
fn certify_callbacks_fire_exactly_once() {
    let soft_count = Arc::new(AtomicU32::new(0));
    let hard_count = Arc::new(AtomicU32::new(0));

    let soft_probe = soft_count.clone();
    let hard_probe = hard_count.clone();

    let mut cost = CostGovernor::new(CostGovernorConfig {
        usd_per_token: 0.001,
        soft_limit_usd: 0.5,
        hard_limit_usd: 0.7,
        on_soft_limit: Some(Box::new(move |_ledger| {
            soft_probe.fetch_add(1, Ordering::SeqCst);
        })),
        on_hard_limit: Some(Box::new(move |_ledger| {
            hard_probe.fetch_add(1, Ordering::SeqCst);
        })),
        on_soft_reset: None,
        chaos_latency_ms: 0,
        chaos_drop_percentage: 0.0,
    });

    // Varias acumulaciones por encima de ambos umbrales.
    for _ in 0..5 {
        cost.add_usage(UsageDelta { input_tokens: Some(400), output_tokens: Some(0) });
    }

    assert_eq!(soft_count.load(Ordering::SeqCst), 1, "Soft hook must fire exactly once.");
    assert_eq!(hard_count.load(Ordering::SeqCst), 1, "Hard hook must fire exactly once.");
}

#[test]
fn certify_production_suppresses_chaos_knobs() {
    let config = CostGovernorConfig {
        usd_per_token: 0.001,
        soft_limit_usd: 1.0,
        hard_limit_usd: 2.0,
        on_soft_limit: None,
        on_hard_limit: None,
        on_soft_reset: None,
        chaos_latency_ms: 500,
        chaos_drop_percentage: 25.0,
    }
    .sealed_for_environment(true);

    let cost = CostGovernor::new(config);
    assert_eq!(cost.chaos_latency_ms(), 0, "Production must force chaos latency to zero.");
    assert_eq!(cost.chaos_drop_percentage(), 0.0);
}

#[test]
fn certify_snapshot_reflects_ledger() {
    let mut cost = governor(0.5, 0.7, 0.001);
    cost.add_usage(UsageDelta { input_tokens: Some(100), output_tokens: Some(100) });

    let snapshot = cost.snapshot();
    assert!((snapshot.usd_estimate - 0.2).abs() < 1e-9);
    assert_eq!(snapshot.soft_limit_usd, 0.5);
    assert!(!snapshot.throttled);
    assert!(!snapshot.fallback);
}
