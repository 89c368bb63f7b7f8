// [libs/domain/scenarios/src/catalog/teen_svt.rs]
/*!
 * =================================================================
 * APARATO: TEEN SVT COMPLEX SCENARIO (V7.0 - TREATMENT ARC)
 * CLASIFICACIÓN: SCENARIO CATALOG (ESTRATO L2)
 * RESPONSABILIDAD: SVT SOSTENIDA CON VENTANA DE TRATAMIENTO COMPLETA
 *
 * Arco clínico: presentación taquicárdica -> instalación de SVT a los
 * dos minutos -> ventana de tratamiento (vagales, adenosina x2,
 * cardioversión) -> conversión o decompensación guiada por reglas.
 * Los desenlaces probabilísticos viven en los manejadores de
 * tratamiento; las tablas de abajo son deterministas.
 * =================================================================
 */

use crate::stage::{
    baseline_vitals, exam_map, StageDefinition, StageTransition, TransitionTrigger, TransitionWhen,
    VitalsDrift,
};
use crate::scoring::{ScoreItem, ScoringConfig};
use crate::{CharacterRole, PatientProfile, ScenarioDefinition};
use codeblue_domain_models::extended::svt::{SvtPhase, SvtRhythm};
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::{
    ConditionLogic, PhysiologyRule, Priority, RuleCondition, RuleEffect,
};
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_physiology::triggers::{CharacterTrigger, TriggerPools};

pub fn build() -> ScenarioDefinition {
    ScenarioDefinition {
        id: ScenarioId::TeenSvtComplexV1,
        patient: PatientProfile {
            display_name: "Alexis",
            age_months: 184,
            weight_kg: 50.0,
            rhythm_augmentations: Vec::new(),
        },
        initial_stage: "presentation",
        stages: stages(),
        rules: rules(),
        triggers: Some(triggers()),
        scoring: Some(scoring()),
        roster: vec![
            CharacterRole { id: "patient", display_name: "Alexis" },
            CharacterRole { id: "parent", display_name: "Mrs. Rivera" },
            CharacterRole { id: "nurse", display_name: "Dana, RN" },
        ],
    }
}

fn stages() -> Vec<StageDefinition> {
    vec![
        StageDefinition {
            id: "presentation".to_string(),
            vitals: baseline_vitals(135.0, 22.0, 98.0, 98.6, "118/74"),
            exam: exam_map(&[
                ("general", "Anxious teen, hand pressed to chest"),
                ("cardiac", "Rapid regular rhythm, no murmur"),
                ("lungs", "Clear bilaterally"),
            ]),
            rhythm_summary: "Sinus tachycardia, 135 bpm".to_string(),
            drift: Some(VitalsDrift {
                heart_rate_per_min: 3.0,
                ..VitalsDrift::default()
            }),
            allowed_intents: None,
            transitions: vec![StageTransition {
                to: "svt_onset".to_string(),
                when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 120.0 }),
            }],
        },
        StageDefinition {
            id: "svt_onset".to_string(),
            vitals: baseline_vitals(220.0, 26.0, 96.0, 98.6, "92/58"),
            exam: exam_map(&[
                ("general", "Pale, diaphoretic, speaking in short sentences"),
                ("cardiac", "Regular tachycardia too rapid to count"),
                ("lungs", "Clear, mildly tachypneic"),
            ]),
            rhythm_summary: "SVT 220 bpm, narrow complex, regular".to_string(),
            drift: None,
            allowed_intents: Some(vec![
                "intent_updateVitals".to_string(),
                "intent_revealFinding".to_string(),
                "intent_setEmotion".to_string(),
            ]),
            transitions: Vec::new(),
        },
        StageDefinition {
            id: "decompensating".to_string(),
            vitals: baseline_vitals(228.0, 30.0, 92.0, 98.6, "78/45"),
            exam: exam_map(&[
                ("general", "Drowsy, mottled, delayed capillary refill"),
                ("cardiac", "Rapid regular tachycardia, thready pulses"),
            ]),
            rhythm_summary: "SVT 228 bpm, narrow complex, regular".to_string(),
            drift: Some(VitalsDrift {
                systolic_per_min: -1.5,
                oxygen_saturation_per_min: -0.4,
                ..VitalsDrift::default()
            }),
            allowed_intents: Some(vec![
                "intent_updateVitals".to_string(),
                "intent_setEmotion".to_string(),
            ]),
            transitions: Vec::new(),
        },
        StageDefinition {
            id: "converted".to_string(),
            vitals: baseline_vitals(95.0, 18.0, 99.0, 98.6, "110/70"),
            exam: exam_map(&[
                ("general", "Color improving, visibly relieved"),
                ("cardiac", "Regular rhythm, no murmur"),
            ]),
            rhythm_summary: "Normal sinus rhythm".to_string(),
            drift: None,
            allowed_intents: None,
            transitions: Vec::new(),
        },
    ]
}

fn rules() -> Vec<PhysiologyRule> {
    vec![
        // SVT sostenida: recordatorio de la enfermera y erosión de presión.
        PhysiologyRule {
            id: "svt_sustained_warning".to_string(),
            conditions: vec![
                RuleCondition::RhythmIs { rhythm: SvtRhythm::Svt },
                RuleCondition::TimeInPhaseGte { minutes: 2.0 },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::NurseLine {
                    line: "Doctor, she's been in SVT over two minutes now. Rate is holding at 220.".to_string(),
                    priority: Priority::High,
                },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta { systolic: Some(-4.0), ..VitalsDelta::default() },
                },
            ],
            delay_seconds: None,
            cooldown_seconds: Some(120.0),
            max_triggers: Some(3),
        },
        // Declive de estabilidad a los cinco minutos de fase.
        PhysiologyRule {
            id: "svt_stability_decline".to_string(),
            conditions: vec![
                RuleCondition::RhythmIs { rhythm: SvtRhythm::Svt },
                RuleCondition::TimeInPhaseGte { minutes: 5.0 },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::SetStabilityLevel { level: 2 },
                RuleEffect::NurseLine {
                    line: "Her pressure is drifting down and she's looking pale.".to_string(),
                    priority: Priority::High,
                },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        systolic: Some(-6.0),
                        oxygen_saturation: Some(-1.0),
                        ..VitalsDelta::default()
                    },
                },
            ],
            delay_seconds: None,
            cooldown_seconds: Some(180.0),
            max_triggers: Some(2),
        },
        // Decompensación franca si la SVT persiste diez minutos.
        PhysiologyRule {
            id: "svt_decompensation".to_string(),
            conditions: vec![
                RuleCondition::RhythmIs { rhythm: SvtRhythm::Svt },
                RuleCondition::TimeInPhaseGte { minutes: 10.0 },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::SetStabilityLevel { level: 3 },
                RuleEffect::AdvancePhase { phase_id: "decompensating".to_string() },
                RuleEffect::NurseLine {
                    line: "Pressure is 78 systolic — she's not perfusing. We need to move now.".to_string(),
                    priority: Priority::Critical,
                },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        systolic: Some(-10.0),
                        oxygen_saturation: Some(-2.0),
                        ..VitalsDelta::default()
                    },
                },
            ],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        // Cierre tranquilizador tras la conversión.
        PhysiologyRule {
            id: "post_conversion_reassure".to_string(),
            conditions: vec![RuleCondition::Converted { expected: true }],
            condition_logic: ConditionLogic::All,
            effects: vec![RuleEffect::NurseLine {
                line: "Sinus rhythm on the monitor. Nice work, team.".to_string(),
                priority: Priority::Normal,
            }],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
    ]
}

fn triggers() -> TriggerPools {
    TriggerPools {
        nurse: vec![
            CharacterTrigger {
                id: "nurse_svt_onset",
                condition: |extended, _elapsed| {
                    matches!(extended, ExtendedState::Svt(state) if state.phase == SvtPhase::SvtOnset)
                },
                line: "She says her heart just took off — monitor is showing a narrow complex tachycardia.",
                cooldown_ms: 60_000,
                max_fires: Some(1),
                priority: Priority::High,
            },
            CharacterTrigger {
                id: "nurse_iv_reminder",
                condition: |extended, _elapsed| {
                    matches!(
                        extended,
                        ExtendedState::Svt(state)
                            if !state.iv_access
                                && matches!(state.phase, SvtPhase::SvtOnset | SvtPhase::TreatmentWindow)
                    )
                },
                line: "Do you want me to get an IV started?",
                cooldown_ms: 90_000,
                max_fires: Some(2),
                priority: Priority::Normal,
            },
            CharacterTrigger {
                id: "nurse_decompensation",
                condition: |extended, _elapsed| {
                    matches!(extended, ExtendedState::Svt(state) if state.stability_level >= 3)
                },
                line: "She's getting sleepy on me — pressure's dropping fast.",
                cooldown_ms: 60_000,
                max_fires: Some(2),
                priority: Priority::Critical,
            },
        ],
        parent: vec![CharacterTrigger {
            id: "parent_worried",
            condition: |extended, _elapsed| {
                matches!(extended, ExtendedState::Svt(state) if !state.converted)
            },
            line: "Is she going to be okay? Her lips look pale to me.",
            cooldown_ms: 120_000,
            max_fires: Some(3),
            priority: Priority::Normal,
        }],
        patient: vec![
            CharacterTrigger {
                id: "patient_flutter",
                condition: |extended, _elapsed| {
                    matches!(
                        extended,
                        ExtendedState::Svt(state) if state.current_rhythm == SvtRhythm::Svt
                    )
                },
                line: "I feel really dizzy... my chest is fluttering so fast.",
                cooldown_ms: 90_000,
                max_fires: Some(3),
                priority: Priority::Normal,
            },
            CharacterTrigger {
                id: "patient_relief",
                condition: |extended, _elapsed| {
                    matches!(extended, ExtendedState::Svt(state) if state.converted)
                },
                line: "Oh... it stopped. I can breathe again.",
                cooldown_ms: 60_000,
                max_fires: Some(1),
                priority: Priority::Normal,
            },
        ],
    }
}

fn scoring() -> ScoringConfig {
    ScoringConfig {
        checklist: vec![
            ScoreItem { id: "monitor_on", points: 10.0, label: "Cardiac monitor attached" },
            ScoreItem { id: "iv_access", points: 10.0, label: "IV access established" },
            ScoreItem { id: "vagal_first", points: 10.0, label: "Vagal maneuver attempted before adenosine" },
            ScoreItem { id: "adenosine_dose_correct", points: 15.0, label: "Adenosine 0.1 mg/kg rapid push" },
            ScoreItem { id: "adenosine_flush", points: 5.0, label: "Rapid saline flush after adenosine" },
            ScoreItem { id: "continuous_monitoring", points: 10.0, label: "Continuous rhythm monitoring through conversion" },
            ScoreItem { id: "cardiology_consult", points: 10.0, label: "Cardiology consulted" },
        ],
        bonuses: vec![
            ScoreItem { id: "rapid_conversion", points: 10.0, label: "Converted within five minutes of onset" },
            ScoreItem { id: "sedation_before_cardioversion", points: 10.0, label: "Sedation provided before synchronized cardioversion" },
        ],
        penalties: vec![
            ScoreItem { id: "unsynchronized_cardioversion", points: 15.0, label: "Cardioversion delivered unsynchronized" },
            ScoreItem { id: "adenosine_slow_push", points: 5.0, label: "Adenosine given without rapid push" },
            ScoreItem { id: "treatment_delay", points: 10.0, label: "No therapy within ten minutes of onset" },
        ],
    }
}
