// [libs/domain/scenarios/src/catalog/palpitations.rs]
/*!
 * =================================================================
 * APARATO: PALPITATIONS SVT SCENARIO (V2.2)
 * CLASIFICACIÓN: SCENARIO CATALOG (ESTRATO L2)
 * RESPONSABILIDAD: SVT PAROXÍSTICA AUTOLIMITADA (VERSIÓN SIMPLE)
 * =================================================================
 */

use crate::stage::{
    baseline_vitals, exam_map, StageDefinition, StageTransition, TransitionTrigger, TransitionWhen,
    VitalsDrift,
};
use crate::{CharacterRole, PatientProfile, ScenarioDefinition};
use codeblue_domain_models::state::ScenarioId;

pub fn build() -> ScenarioDefinition {
    ScenarioDefinition {
        id: ScenarioId::PalpitationsSvt,
        patient: PatientProfile {
            display_name: "Jordan",
            age_months: 170,
            weight_kg: 48.0,
            rhythm_augmentations: Vec::new(),
        },
        initial_stage: "intake",
        stages: vec![
            StageDefinition {
                id: "intake".to_string(),
                vitals: baseline_vitals(98.0, 18.0, 99.0, 98.4, "116/72"),
                exam: exam_map(&[
                    ("general", "Comfortable, describes fluttering episodes after caffeine"),
                    ("cardiac", "Regular rhythm, no murmur"),
                ]),
                rhythm_summary: "Normal sinus rhythm".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: vec![
                    StageTransition {
                        to: "history_deep_dive".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::AskedAboutExertion),
                    },
                    StageTransition {
                        to: "svt_run".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 120.0 }),
                    },
                ],
            },
            StageDefinition {
                id: "history_deep_dive".to_string(),
                vitals: baseline_vitals(100.0, 18.0, 99.0, 98.4, "114/70"),
                exam: exam_map(&[
                    ("general", "Episodes start and stop abruptly, last a few minutes"),
                ]),
                rhythm_summary: "Normal sinus rhythm".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: vec![StageTransition {
                    to: "svt_run".to_string(),
                    when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 60.0 }),
                }],
            },
            StageDefinition {
                id: "svt_run".to_string(),
                vitals: baseline_vitals(225.0, 24.0, 97.0, 98.4, "104/66"),
                exam: exam_map(&[
                    ("general", "Suddenly clutches chest, anxious"),
                    ("cardiac", "Rapid regular rhythm, too fast to count at bedside"),
                ]),
                rhythm_summary: "SVT 225 bpm, narrow complex, regular".to_string(),
                drift: Some(VitalsDrift {
                    oxygen_saturation_per_min: -0.3,
                    ..VitalsDrift::default()
                }),
                allowed_intents: Some(vec![
                    "intent_updateVitals".to_string(),
                    "intent_revealFinding".to_string(),
                    "intent_setEmotion".to_string(),
                ]),
                transitions: vec![StageTransition {
                    to: "spontaneous_conversion".to_string(),
                    when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 300.0 }),
                }],
            },
            StageDefinition {
                id: "spontaneous_conversion".to_string(),
                vitals: baseline_vitals(96.0, 18.0, 99.0, 98.4, "114/72"),
                exam: exam_map(&[("general", "Visible relief, episode resolved")]),
                rhythm_summary: "Normal sinus rhythm".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: Vec::new(),
            },
        ],
        rules: Vec::new(),
        triggers: None,
        scoring: None,
        roster: vec![
            CharacterRole { id: "patient", display_name: "Jordan" },
            CharacterRole { id: "nurse", display_name: "Sam, RN" },
        ],
    }
}
