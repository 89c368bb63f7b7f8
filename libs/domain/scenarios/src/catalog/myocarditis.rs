// [libs/domain/scenarios/src/catalog/myocarditis.rs]
/*!
 * =================================================================
 * APARATO: PEDS MYOCARDITIS SCENARIO (V9.0 - SILENT CRASH)
 * CLASIFICACIÓN: SCENARIO CATALOG (ESTRATO L2)
 * RESPONSABILIDAD: SHOCK CARDIOGÉNICO PEDIÁTRICO DE INSTALACIÓN SILENTE
 *
 * Trampas docentes codificadas en las tablas:
 * - Sobrecarga de volumen (bolos generosos en bomba que no tolera).
 * - Inducción con propofol sin vasopresor preparado (colapso diferido).
 * - PEEP alta en shock avanzado (hipotensión por precarga).
 * =================================================================
 */

use crate::stage::{
    baseline_vitals, exam_map, StageDefinition, StageTransition, TransitionTrigger, TransitionWhen,
    VitalsDrift,
};
use crate::scoring::{ScoreItem, ScoringConfig};
use crate::{CharacterRole, PatientProfile, ScenarioDefinition};
use codeblue_domain_models::extended::myocarditis::{InductionAgent, MyoPhase};
use codeblue_domain_models::extended::ExtendedState;
use codeblue_domain_models::rules::{
    ConditionLogic, InotropeSelector, PhysiologyRule, Priority, RuleCondition, RuleEffect,
};
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_models::vitals::VitalsDelta;
use codeblue_domain_physiology::rhythm::RhythmAugmentation;
use codeblue_domain_physiology::triggers::{CharacterTrigger, TriggerPools};

pub fn build() -> ScenarioDefinition {
    ScenarioDefinition {
        id: ScenarioId::PedsMyocarditisSilentCrashV1,
        patient: PatientProfile {
            display_name: "Tommy",
            age_months: 104,
            weight_kg: 32.0,
            rhythm_augmentations: vec![RhythmAugmentation::LowVoltage],
        },
        initial_stage: "scene_set",
        stages: stages(),
        rules: rules(),
        triggers: Some(triggers()),
        scoring: Some(scoring()),
        roster: vec![
            CharacterRole { id: "patient", display_name: "Tommy" },
            CharacterRole { id: "parent", display_name: "Mr. Chen" },
            CharacterRole { id: "nurse", display_name: "Priya, RN" },
        ],
    }
}

fn stages() -> Vec<StageDefinition> {
    vec![
        StageDefinition {
            id: "scene_set".to_string(),
            vitals: baseline_vitals(138.0, 32.0, 94.0, 99.1, "88/54"),
            exam: exam_map(&[
                ("general", "Tired-appearing boy, mottled extremities, 'just the flu' per dad"),
                ("cardiac", "Tachycardic with a subtle gallop"),
                ("lungs", "Faint crackles at both bases"),
                ("abdomen", "Liver edge palpable 3 cm below costal margin"),
            ]),
            rhythm_summary: "Sinus tachycardia, 138 bpm, diffuse low voltage".to_string(),
            drift: Some(VitalsDrift {
                heart_rate_per_min: 1.0,
                systolic_per_min: -1.0,
                ..VitalsDrift::default()
            }),
            allowed_intents: None,
            transitions: vec![StageTransition {
                to: "quiet_decline".to_string(),
                when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 300.0 }),
            }],
        },
        StageDefinition {
            id: "quiet_decline".to_string(),
            vitals: baseline_vitals(152.0, 36.0, 92.0, 99.1, "80/48"),
            exam: exam_map(&[
                ("general", "More listless, cool extremities, thready distal pulses"),
                ("cardiac", "Gallop more prominent"),
                ("lungs", "Crackles climbing to mid-zones"),
            ]),
            rhythm_summary: "Sinus tachycardia, 152 bpm, diffuse low voltage".to_string(),
            drift: Some(VitalsDrift {
                heart_rate_per_min: 1.5,
                systolic_per_min: -1.5,
                oxygen_saturation_per_min: -0.2,
                ..VitalsDrift::default()
            }),
            allowed_intents: None,
            transitions: vec![StageTransition {
                to: "crash".to_string(),
                when: TransitionWhen::Single(TransitionTrigger::TimeElapsed { seconds: 300.0 }),
            }],
        },
        StageDefinition {
            id: "crash".to_string(),
            vitals: baseline_vitals(168.0, 44.0, 88.0, 99.1, "68/40"),
            exam: exam_map(&[
                ("general", "Obtunded, mottled to the knees"),
                ("cardiac", "Gallop, barely palpable femoral pulses"),
                ("lungs", "Diffuse crackles, grunting respirations"),
            ]),
            rhythm_summary: "Sinus tachycardia, 168 bpm, diffuse low voltage".to_string(),
            drift: Some(VitalsDrift {
                systolic_per_min: -2.0,
                oxygen_saturation_per_min: -0.3,
                ..VitalsDrift::default()
            }),
            allowed_intents: Some(vec![
                "intent_updateVitals".to_string(),
                "intent_setEmotion".to_string(),
            ]),
            transitions: Vec::new(),
        },
        StageDefinition {
            id: "stabilized".to_string(),
            vitals: baseline_vitals(140.0, 30.0, 95.0, 99.1, "86/52"),
            exam: exam_map(&[
                ("general", "Perfusion improving on inotropes, less mottled"),
                ("lungs", "Crackles persist but work of breathing eased"),
            ]),
            rhythm_summary: "Sinus tachycardia, 140 bpm, diffuse low voltage".to_string(),
            drift: None,
            allowed_intents: None,
            transitions: Vec::new(),
        },
    ]
}

fn rules() -> Vec<PhysiologyRule> {
    vec![
        // Sobrecarga de volumen: la bomba enferma no tolera bolos generosos.
        PhysiologyRule {
            id: "fluid_overload".to_string(),
            conditions: vec![RuleCondition::FluidsMlKgInWindow {
                threshold_ml_kg: 25.0,
                window_minutes: 10.0,
            }],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::SetFlag { flag: "pulmonary_edema".to_string(), value: true },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        oxygen_saturation: Some(-8.0),
                        respiratory_rate: Some(10.0),
                        ..VitalsDelta::default()
                    },
                },
                RuleEffect::NurseLine {
                    line: "His sats are falling after that bolus — lungs sound wet everywhere.".to_string(),
                    priority: Priority::Critical,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: Some(300.0),
            max_triggers: Some(2),
        },
        // Sobrecarga severa: más allá de 60 mL/kg el shock se profundiza.
        PhysiologyRule {
            id: "fluid_overload_severe".to_string(),
            conditions: vec![RuleCondition::FluidsMlKgInWindow {
                threshold_ml_kg: 60.0,
                window_minutes: 30.0,
            }],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::AdvanceShockStage { stage: 4 },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        oxygen_saturation: Some(-5.0),
                        systolic: Some(-8.0),
                        ..VitalsDelta::default()
                    },
                },
                RuleEffect::NurseLine {
                    line: "He's drowning in that volume — sats in the low 80s and pressure is worse.".to_string(),
                    priority: Priority::Critical,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        // La epinefrina temprana estabiliza la hemodinamia.
        PhysiologyRule {
            id: "epi_stabilizes".to_string(),
            conditions: vec![
                RuleCondition::InotropeRunning { drug: InotropeSelector::Epi },
                RuleCondition::ShockStageGte { stage: 2 },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::SetFlag { flag: "stabilizing".to_string(), value: true },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        systolic: Some(8.0),
                        diastolic: Some(4.0),
                        heart_rate: Some(-6.0),
                        ..VitalsDelta::default()
                    },
                },
                RuleEffect::NurseLine {
                    line: "Pressure is coming up with the epi drip.".to_string(),
                    priority: Priority::Normal,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: Some(120.0),
            max_triggers: Some(3),
        },
        // Milrinona sin vasopresor de respaldo: vasodilatación peligrosa.
        PhysiologyRule {
            id: "milrinone_hypotension".to_string(),
            conditions: vec![
                RuleCondition::InotropeRunning { drug: InotropeSelector::Milrinone },
                RuleCondition::PressorAtBedside { expected: false },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        systolic: Some(-6.0),
                        diastolic: Some(-4.0),
                        ..VitalsDelta::default()
                    },
                },
                RuleEffect::NurseLine {
                    line: "Pressure dipped after starting the milrinone — do we have a pressor drawn up?".to_string(),
                    priority: Priority::High,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: Some(180.0),
            max_triggers: Some(2),
        },
        // La trampa de la intubación: propofol en shock sin vasopresor.
        PhysiologyRule {
            id: "propofol_collapse".to_string(),
            conditions: vec![
                RuleCondition::IntubationInduction { agent: InductionAgent::Propofol },
                RuleCondition::ShockStageGte { stage: 2 },
                RuleCondition::PressorAtBedside { expected: false },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::SetFlag { flag: "intubation_collapse".to_string(), value: true },
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta {
                        heart_rate: Some(-40.0),
                        systolic: Some(-30.0),
                        diastolic: Some(-15.0),
                        oxygen_saturation: Some(-15.0),
                        ..VitalsDelta::default()
                    },
                },
                RuleEffect::TriggerCodeBlue,
                RuleEffect::NurseLine {
                    line: "He's bradying down — I can't feel a pulse! Starting compressions!".to_string(),
                    priority: Priority::Critical,
                },
            ],
            delay_seconds: Some(10.0),
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        // PEEP alta con precarga crítica: hipotensión inmediata.
        PhysiologyRule {
            id: "high_peep_hypotension".to_string(),
            conditions: vec![
                RuleCondition::PeepGte { centimeters_water: 10.0 },
                RuleCondition::ShockStageGte { stage: 3 },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::VitalsDelta {
                    delta: VitalsDelta { systolic: Some(-8.0), ..VitalsDelta::default() },
                },
                RuleEffect::NurseLine {
                    line: "Pressure dropped as soon as we went up on the PEEP.".to_string(),
                    priority: Priority::High,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: Some(120.0),
            max_triggers: Some(2),
        },
        // Progresión silenciosa del arco: reconocimiento.
        PhysiologyRule {
            id: "myo_phase_recognition".to_string(),
            conditions: vec![RuleCondition::TimeInPhaseGte { minutes: 5.0 }],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::AdvancePhase { phase_id: "recognition".to_string() },
                RuleEffect::AdvanceShockStage { stage: 2 },
                RuleEffect::NurseLine {
                    line: "His pressure keeps trending down and he's more listless than at triage.".to_string(),
                    priority: Priority::High,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        // Progresión a decompensación franca.
        PhysiologyRule {
            id: "myo_phase_decompensation".to_string(),
            conditions: vec![
                RuleCondition::TimeInPhaseGte { minutes: 10.0 },
                RuleCondition::ShockStageGte { stage: 2 },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::AdvancePhase { phase_id: "decompensation".to_string() },
                RuleEffect::AdvanceShockStage { stage: 3 },
                RuleEffect::NurseLine {
                    line: "Femoral pulse is thready — this is not just dehydration.".to_string(),
                    priority: Priority::Critical,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        // Confirmación y disposición: eco + cardiología cierran el arco.
        PhysiologyRule {
            id: "echo_confirms_disposition".to_string(),
            conditions: vec![
                RuleCondition::DiagnosticOrdered { test: "echo".to_string() },
                RuleCondition::ConsultCalled { service: "cardiology".to_string() },
            ],
            condition_logic: ConditionLogic::All,
            effects: vec![
                RuleEffect::AdvancePhase { phase_id: "confirmation_disposition".to_string() },
                RuleEffect::NurseLine {
                    line: "Cardiology saw the echo — poor squeeze, they want him in the PICU now.".to_string(),
                    priority: Priority::Normal,
                },
            ],
            delay_seconds: None,
            cooldown_seconds: None,
            max_triggers: Some(1),
        },
        // El equipo de ECMO queda notificado en espera.
        PhysiologyRule {
            id: "ecmo_standby".to_string(),
            conditions: vec![RuleCondition::ConsultCalled { service: "ecmo".to_string() }],
            condition_logic: ConditionLogic::All,
            effects: vec![RuleEffect::NurseLine {
                line: "ECMO team has been paged and is on standby.".to_string(),
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
                id: "nurse_gallop",
                condition: |extended, _elapsed| {
                    matches!(
                        extended,
                        ExtendedState::Myocarditis(state)
                            if state.phase != MyoPhase::SceneSet && state.shock_stage >= 2
                    )
                },
                line: "I keep hearing that gallop... and his liver feels down to me.",
                cooldown_ms: 180_000,
                max_fires: Some(1),
                priority: Priority::High,
            },
            CharacterTrigger {
                id: "nurse_wet_lungs",
                condition: |extended, _elapsed| {
                    matches!(
                        extended,
                        ExtendedState::Myocarditis(state) if state.flags.pulmonary_edema
                    )
                },
                line: "Sats keep sagging — he's working harder to breathe after those fluids.",
                cooldown_ms: 60_000,
                max_fires: Some(3),
                priority: Priority::Critical,
            },
        ],
        parent: vec![CharacterTrigger {
            id: "parent_flu_story",
            condition: |extended, _elapsed| {
                matches!(
                    extended,
                    ExtendedState::Myocarditis(state) if !state.flags.code_blue_active
                )
            },
            line: "He just had the flu last week... the pediatrician said it was nothing serious.",
            cooldown_ms: 150_000,
            max_fires: Some(2),
            priority: Priority::Normal,
        }],
        patient: vec![CharacterTrigger {
            id: "patient_tired",
            condition: |extended, _elapsed| {
                matches!(
                    extended,
                    ExtendedState::Myocarditis(state) if state.shock_stage < 4
                )
            },
            line: "I'm so tired... my tummy hurts.",
            cooldown_ms: 120_000,
            max_fires: Some(2),
            priority: Priority::Normal,
        }],
    }
}

fn scoring() -> ScoringConfig {
    ScoringConfig {
        checklist: vec![
            ScoreItem { id: "recognized_shock", points: 15.0, label: "Recognized cardiogenic shock physiology" },
            ScoreItem { id: "ecg_ordered", points: 5.0, label: "12-lead ECG obtained" },
            ScoreItem { id: "echo_ordered", points: 10.0, label: "Bedside echo ordered" },
            ScoreItem { id: "cautious_fluids", points: 10.0, label: "Fluids limited to cautious 5-10 mL/kg aliquots" },
            ScoreItem { id: "early_inotrope", points: 15.0, label: "Inotrope started before complete collapse" },
            ScoreItem { id: "picu_consult", points: 10.0, label: "PICU consulted" },
            ScoreItem { id: "cardiology_consult", points: 10.0, label: "Cardiology consulted" },
            ScoreItem { id: "ketamine_induction", points: 10.0, label: "Hemodynamically neutral induction chosen" },
            ScoreItem { id: "pressor_ready_before_intubation", points: 10.0, label: "Push-dose pressor drawn before airway" },
        ],
        bonuses: vec![
            ScoreItem { id: "ecmo_activation", points: 5.0, label: "ECMO team alerted pre-emptively" },
            ScoreItem { id: "push_dose_epi_ready", points: 5.0, label: "Push-dose epi at bedside" },
        ],
        penalties: vec![
            ScoreItem { id: "fluid_overload", points: 15.0, label: "More than 60 mL/kg in cardiogenic shock" },
            ScoreItem { id: "propofol_in_shock", points: 15.0, label: "Propofol induction in decompensated shock" },
            ScoreItem { id: "unprepared_intubation", points: 10.0, label: "Airway attempted without pressor ready" },
        ],
    }
}
