// [libs/domain/scenarios/src/stage.rs]
/*!
 * =================================================================
 * APARATO: STAGE GRAPH CONTRACT (V5.0 - TRANSITION SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: ESTADIOS, TRANSICIONES Y DERIVA DE UN ESCENARIO
 *
 * # Mathematical Proof (Graph Closure):
 * Toda transición referencia un estadio del MISMO escenario; la
 * certificación de catálogo ('validate_catalog') rechaza cualquier
 * grafo con aristas colgantes antes de llegar a producción.
 * =================================================================
 */

use codeblue_domain_models::vitals::Vitals;
use std::collections::{BTreeMap, HashSet};

/// Clave de acción registrada cuando el equipo indaga por esfuerzo.
pub const ACTION_ASKED_ABOUT_EXERTION: &str = "asked_about_exertion";
/// Clave de acción registrada al ejecutar la prueba de bipedestación.
pub const ACTION_STAND_TEST: &str = "stand_test";
/// Clave de acción registrada al indagar historia familiar.
pub const ACTION_ASKED_FAMILY_HISTORY: &str = "asked_family_history";

/// Disparador individual de una transición de estadio.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionTrigger {
    AskedAboutExertion,
    StandTest,
    AskedFamilyHistory,
    /// Segundos transcurridos dentro del estadio vigente.
    TimeElapsed { seconds: f64 },
}

impl TransitionTrigger {
    /// Evalúa el disparador contra el set de acciones y el reloj.
    pub fn satisfied(&self, actions: &HashSet<String>, elapsed_stage_seconds: f64) -> bool {
        match self {
            TransitionTrigger::AskedAboutExertion => actions.contains(ACTION_ASKED_ABOUT_EXERTION),
            TransitionTrigger::StandTest => actions.contains(ACTION_STAND_TEST),
            TransitionTrigger::AskedFamilyHistory => actions.contains(ACTION_ASKED_FAMILY_HISTORY),
            TransitionTrigger::TimeElapsed { seconds } => elapsed_stage_seconds >= *seconds,
        }
    }
}

/// Composición lógica de disparadores de una transición.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionWhen {
    Single(TransitionTrigger),
    Any(Vec<TransitionTrigger>),
    All(Vec<TransitionTrigger>),
}

impl TransitionWhen {
    pub fn satisfied(&self, actions: &HashSet<String>, elapsed_stage_seconds: f64) -> bool {
        match self {
            TransitionWhen::Single(trigger) => trigger.satisfied(actions, elapsed_stage_seconds),
            TransitionWhen::Any(triggers) => triggers
                .iter()
                .any(|trigger| trigger.satisfied(actions, elapsed_stage_seconds)),
            TransitionWhen::All(triggers) => triggers
                .iter()
                .all(|trigger| trigger.satisfied(actions, elapsed_stage_seconds)),
        }
    }
}

/// Arista saliente del grafo de estadios.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTransition {
    /// Identificador del estadio destino (mismo escenario).
    pub to: String,
    pub when: TransitionWhen,
}

/// Deriva de vitales por minuto mientras el estadio está activo.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VitalsDrift {
    pub heart_rate_per_min: f64,
    pub systolic_per_min: f64,
    pub diastolic_per_min: f64,
    pub oxygen_saturation_per_min: f64,
}

impl VitalsDrift {
    /// Verdadero si toda dimensión de la deriva es nula.
    pub fn is_inert(&self) -> bool {
        self.heart_rate_per_min == 0.0
            && self.systolic_per_min == 0.0
            && self.diastolic_per_min == 0.0
            && self.oxygen_saturation_per_min == 0.0
    }
}

/// Estadio discreto de un escenario.
#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub id: String,
    /// Vitales basales instalados al entrar al estadio.
    pub vitals: Vitals,
    /// Hallazgos de examen por región.
    pub exam: BTreeMap<String, String>,
    pub rhythm_summary: String,
    /// Deriva por minuto (None = estadio estático).
    pub drift: Option<VitalsDrift>,
    /// Allowlist de intents (None = conjunto universal permitido).
    pub allowed_intents: Option<Vec<String>>,
    pub transitions: Vec<StageTransition>,
}

/// Constructor abreviado de vitales basales para el catálogo.
pub fn baseline_vitals(
    heart_rate: f64,
    respiratory_rate: f64,
    oxygen_saturation: f64,
    temperature: f64,
    blood_pressure: &str,
) -> Vitals {
    Vitals {
        heart_rate,
        respiratory_rate,
        oxygen_saturation,
        temperature,
        blood_pressure: blood_pressure.to_string(),
    }
}

/// Constructor abreviado del mapa de examen para el catálogo.
pub fn exam_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(region, finding)| (region.to_string(), finding.to_string()))
        .collect()
}
