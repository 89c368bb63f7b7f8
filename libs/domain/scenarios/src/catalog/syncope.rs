// [libs/domain/scenarios/src/catalog/syncope.rs]
/*!
 * =================================================================
 * APARATO: SYNCOPE SCENARIO (V3.1)
 * CLASIFICACIÓN: SCENARIO CATALOG (ESTRATO L2)
 * RESPONSABILIDAD: SÍNCOPE DE ESFUERZO ADOLESCENTE (HCM OCULTA)
 *
 * Escenario simple: sin motor de reglas ni disparadores; el arco se
 * conduce por transiciones de historia clínica y prueba de pie.
 * =================================================================
 */

use crate::stage::{
    baseline_vitals, exam_map, StageDefinition, StageTransition, TransitionTrigger, TransitionWhen,
    VitalsDrift,
};
use crate::{CharacterRole, PatientProfile, ScenarioDefinition};
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_physiology::rhythm::RhythmAugmentation;

pub fn build() -> ScenarioDefinition {
    ScenarioDefinition {
        id: ScenarioId::Syncope,
        patient: PatientProfile {
            display_name: "Maya",
            age_months: 196,
            weight_kg: 58.0,
            rhythm_augmentations: vec![RhythmAugmentation::LeftVentricularHypertrophy],
        },
        initial_stage: "triage",
        stages: vec![
            StageDefinition {
                id: "triage".to_string(),
                vitals: baseline_vitals(88.0, 16.0, 99.0, 98.2, "112/70"),
                exam: exam_map(&[
                    ("general", "Pale, mildly diaphoretic, anxious after collapse at practice"),
                    ("cardiac", "Regular rhythm, harsh systolic murmur at left sternal border"),
                ]),
                rhythm_summary: "Normal sinus rhythm, LVH by voltage criteria".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: vec![
                    StageTransition {
                        to: "exertional_history".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::AskedAboutExertion),
                    },
                    StageTransition {
                        to: "orthostatic_challenge".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::StandTest),
                    },
                    StageTransition {
                        to: "family_history".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::AskedFamilyHistory),
                    },
                ],
            },
            StageDefinition {
                id: "exertional_history".to_string(),
                vitals: baseline_vitals(92.0, 16.0, 99.0, 98.2, "110/68"),
                exam: exam_map(&[
                    ("general", "Recounts dimming vision mid-sprint, no prodrome"),
                    ("cardiac", "Murmur louder with Valsalva"),
                ]),
                rhythm_summary: "Normal sinus rhythm, LVH by voltage criteria".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: vec![
                    StageTransition {
                        to: "orthostatic_challenge".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::StandTest),
                    },
                    StageTransition {
                        to: "family_history".to_string(),
                        when: TransitionWhen::Single(TransitionTrigger::AskedFamilyHistory),
                    },
                ],
            },
            StageDefinition {
                id: "orthostatic_challenge".to_string(),
                vitals: baseline_vitals(118.0, 18.0, 98.0, 98.2, "98/62"),
                exam: exam_map(&[
                    ("general", "Lightheaded standing, steadies against the stretcher"),
                ]),
                rhythm_summary: "Sinus tachycardia, 118 bpm, LVH by voltage criteria".to_string(),
                drift: Some(VitalsDrift {
                    heart_rate_per_min: 2.0,
                    systolic_per_min: -2.0,
                    ..VitalsDrift::default()
                }),
                allowed_intents: Some(vec![
                    "intent_updateVitals".to_string(),
                    "intent_revealFinding".to_string(),
                ]),
                transitions: vec![StageTransition {
                    to: "recovery".to_string(),
                    when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 90.0 }),
                }],
            },
            StageDefinition {
                id: "family_history".to_string(),
                vitals: baseline_vitals(90.0, 16.0, 99.0, 98.2, "112/70"),
                exam: exam_map(&[
                    ("general", "Mother recalls an uncle who died suddenly swimming at 30"),
                ]),
                rhythm_summary: "Normal sinus rhythm, LVH by voltage criteria".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: vec![StageTransition {
                    to: "recovery".to_string(),
                    when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 120.0 }),
                }],
            },
            StageDefinition {
                id: "recovery".to_string(),
                vitals: baseline_vitals(84.0, 14.0, 99.0, 98.2, "114/72"),
                exam: exam_map(&[("general", "Resting comfortably, color returned")]),
                rhythm_summary: "Normal sinus rhythm, LVH by voltage criteria".to_string(),
                drift: None,
                allowed_intents: None,
                transitions: Vec::new(),
            },
        ],
        rules: Vec::new(),
        triggers: None,
        scoring: None,
        roster: vec![
            CharacterRole { id: "patient", display_name: "Maya" },
            CharacterRole { id: "parent", display_name: "Maya's mother" },
            CharacterRole { id: "nurse", display_name: "Sam, RN" },
        ],
    }
}
