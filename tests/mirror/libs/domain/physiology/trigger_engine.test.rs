// [tests/mirror/libs/domain/physiology/trigger_engine.test.rs]
/**
 * =================================================================
 * APARATO: TRIGGER ENGINE CERTIFICATION (V2.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-PHYSIOLOGY
 * RESPONSABILIDAD: PRELACIÓN DE ENFERMERA, COOLDOWN Y TOPE DE DISPAROS
 * =================================================================
 */

use codeblue_domain_models::extended::svt::SvtExtendedState;
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::Priority;
use codeblue_domain_physiology::triggers::{
    record_fire, run_trigger_pass, CharacterTrigger, SpeakingCharacter, TriggerHistory, TriggerPools,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn probe_pools() -> TriggerPools {
    TriggerPools {
        nurse: vec![
            CharacterTrigger {
                id: "nurse_normal",
                condition: |_extended, _elapsed| true,
                line: "Routine observation.",
                cooldown_ms: 10_000,
                max_fires: Some(2),
                priority: Priority::Normal,
            },
            CharacterTrigger {
                id: "nurse_critical",
                condition: |_extended, _elapsed| true,
                line: "She's crashing!",
                cooldown_ms: 10_000,
                max_fires: None,
                priority: Priority::Critical,
            },
        ],
        parent: vec![CharacterTrigger {
            id: "parent_anxious",
            condition: |_extended, _elapsed| true,
            line: "Is she okay?",
            cooldown_ms: 5_000,
            max_fires: None,
            priority: Priority::Normal,
        }],
        patient: Vec::new(),
    }
}

#[test]
fn certify_nurse_priority_wins() {
    println!("\n🗣️ [PROVING_GROUNDS]: Auditing character trigger precedence...");

    let pools = probe_pools();
    let extended = ExtendedState::Svt(SvtExtendedState::initial());
    let history = TriggerHistory::new();
    let mut rng = StdRng::seed_from_u64(7);

    let fired = run_trigger_pass(&pools, &extended, 0, &history, 1_000, &mut rng)
        .expect("A nurse trigger must fire");

    assert_eq!(fired.character, SpeakingCharacter::Nurse);
    assert_eq!(fired.id, "nurse_critical", "Critical priority must beat normal.");

    println!("   ✅ [SUCCESS]: Nurse precedence certified.");
}

#[test]
fn certify_cooldown_gates_refire() {
    let pools = TriggerPools {
        nurse: vec![CharacterTrigger {
            id: "nurse_only",
            condition: |_extended, _elapsed| true,
            line: "Observation.",
            cooldown_ms: 10_000,
            max_fires: None,
            priority: Priority::Normal,
        }],
        parent: Vec::new(),
        patient: Vec::new(),
    };
    let extended = ExtendedState::Svt(SvtExtendedState::initial());
    let mut history = TriggerHistory::new();
    let mut rng = StdRng::seed_from_u64(7);

    let first = run_trigger_pass(&pools, &extended, 0, &history, 1_000, &mut rng).unwrap();
    record_fire(&mut history, &first.id, 1_000);

    // Dentro de la ventana: silencio.
    assert!(run_trigger_pass(&pools, &extended, 0, &history, 5_000, &mut rng).is_none());

    // Pasada la ventana: re-dispara.
    assert!(run_trigger_pass(&pools, &extended, 0, &history, 12_000, &mut rng).is_some());
}

#[test]
fn certify_max_fires_exhaustion() {
    let pools = TriggerPools {
        nurse: vec![CharacterTrigger {
            id: "nurse_capped",
            condition: |_extended, _elapsed| true,
            line: "Capped line.",
            cooldown_ms: 1_000,
            max_fires: Some(2),
            priority: Priority::Normal,
        }],
        parent: Vec::new(),
        patient: Vec::new(),
    };
    let extended = ExtendedState::Svt(SvtExtendedState::initial());
    let mut history = TriggerHistory::new();
    let mut rng = StdRng::seed_from_u64(7);

    let mut fired_count = 0;
    for pass_index in 0..6 {
        let now = 1_000 + pass_index * 5_000;
        if let Some(fired) = run_trigger_pass(&pools, &extended, 0, &history, now, &mut rng) {
            record_fire(&mut history, &fired.id, now);
            fired_count += 1;
        }
    }

    assert_eq!(fired_count, 2, "L2_TRIGGER_FAULT: max_fires ceiling violated.");
}
