// [libs/domain/scenarios/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SCENARIO MASTER REGISTRY (V6.0 - CATALOG SEALED)
 * CLASIFICACIÓN: DOMAIN REGISTRY (ESTRATO L2)
 * RESPONSABILIDAD: CATÁLOGO CERRADO Y DE SOLO LECTURA DE ESCENARIOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. READ-ONLY SOVEREIGNTY: Las definiciones se forjan una vez en un
 *    registro Lazy y se prestan como referencias 'static; ningún
 *    llamador puede mutar el catálogo.
 * 2. CATALOG CERTIFICATION: 'validate_catalog' verifica el cierre del
 *    grafo de transiciones y la inclusión de allowlists en el set
 *    universal de intents.
 * =================================================================
 */

pub mod catalog;
pub mod scoring;
pub mod stage;

pub use scoring::{ScoreItem, ScoringConfig};
pub use stage::{
    baseline_vitals, exam_map, StageDefinition, StageTransition, TransitionTrigger, TransitionWhen,
    VitalsDrift, ACTION_ASKED_ABOUT_EXERTION, ACTION_ASKED_FAMILY_HISTORY, ACTION_STAND_TEST,
};

use codeblue_domain_models::intents::UNIVERSAL_INTENT_TYPES;
use codeblue_domain_models::state::ScenarioId;
use codeblue_domain_physiology::rhythm::RhythmAugmentation;
use codeblue_domain_physiology::triggers::TriggerPools;
use codeblue_domain_models::rules::PhysiologyRule;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Demografía y matices de la paciente simulada.
#[derive(Debug, Clone)]
pub struct PatientProfile {
    pub display_name: &'static str,
    pub age_months: u32,
    pub weight_kg: f64,
    /// Matices de etiqueta de ritmo propios del cuadro clínico.
    pub rhythm_augmentations: Vec<RhythmAugmentation>,
}

/// Personaje guionado disponible en el escenario.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRole {
    pub id: &'static str,
    pub display_name: &'static str,
}

/// Definición completa e inmutable de un escenario.
pub struct ScenarioDefinition {
    pub id: ScenarioId,
    pub patient: PatientProfile,
    pub initial_stage: &'static str,
    pub stages: Vec<StageDefinition>,
    /// Reglas de fisiología (vacías en escenarios simples).
    pub rules: Vec<PhysiologyRule>,
    /// Pools de disparadores de personaje (solo escenarios complejos).
    pub triggers: Option<TriggerPools>,
    /// Configuración de puntaje (solo escenarios complejos).
    pub scoring: Option<ScoringConfig>,
    pub roster: Vec<CharacterRole>,
}

impl ScenarioDefinition {
    /// Busca un estadio del escenario por identificador.
    pub fn stage(&self, stage_id: &str) -> Option<&StageDefinition> {
        self.stages.iter().find(|stage| stage.id == stage_id)
    }

    /// Identificadores de estadio en orden de definición.
    pub fn stage_ids(&self) -> Vec<String> {
        self.stages.iter().map(|stage| stage.id.clone()).collect()
    }
}

/// Registro maestro forjado una única vez por proceso.
static SCENARIO_REGISTRY: Lazy<HashMap<ScenarioId, ScenarioDefinition>> = Lazy::new(|| {
    let mut registry = HashMap::new();
    registry.insert(ScenarioId::Syncope, catalog::syncope::build());
    registry.insert(ScenarioId::PalpitationsSvt, catalog::palpitations::build());
    registry.insert(ScenarioId::TeenSvtComplexV1, catalog::teen_svt::build());
    registry.insert(
        ScenarioId::PedsMyocarditisSilentCrashV1,
        catalog::myocarditis::build(),
    );
    registry
});

/// Presta la definición inmutable del escenario solicitado.
pub fn scenario(scenario_id: ScenarioId) -> &'static ScenarioDefinition {
    SCENARIO_REGISTRY
        .get(&scenario_id)
        .expect("FATAL: Scenario registry incomplete for catalog id")
}

/// Itera el catálogo completo (certificación y herramientas).
pub fn all_scenarios() -> impl Iterator<Item = &'static ScenarioDefinition> {
    SCENARIO_REGISTRY.values()
}

/**
 * Certifica el cierre del catálogo completo.
 *
 * - Toda transición apunta a un estadio del mismo escenario.
 * - Todo allowlist de intents es subconjunto del set universal.
 * - El estadio inicial existe.
 */
pub fn validate_catalog() -> Result<(), String> {
    for definition in all_scenarios() {
        let scenario_label = definition.id.wire_label();

        if definition.stage(definition.initial_stage).is_none() {
            return Err(format!(
                "[CATALOG_FAULT]: Scenario '{}' initial stage '{}' undefined.",
                scenario_label, definition.initial_stage
            ));
        }

        for stage in &definition.stages {
            for transition in &stage.transitions {
                if definition.stage(&transition.to).is_none() {
                    return Err(format!(
                        "[CATALOG_FAULT]: Scenario '{}' stage '{}' points to undefined stage '{}'.",
                        scenario_label, stage.id, transition.to
                    ));
                }
            }

            if let Some(allowlist) = &stage.allowed_intents {
                for intent_type in allowlist {
                    if !UNIVERSAL_INTENT_TYPES.contains(&intent_type.as_str()) {
                        return Err(format!(
                            "[CATALOG_FAULT]: Scenario '{}' stage '{}' allows unknown intent '{}'.",
                            scenario_label, stage.id, intent_type
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}
