// [libs/domain/models/src/rules.rs]
/*!
 * =================================================================
 * APARATO: PHYSIOLOGY RULE CONTRACT (V5.0 - DETERMINISTIC CORE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA DECLARATIVA CONDICIÓN -> EFECTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CLOSED SUM TYPES: Condiciones y efectos son uniones etiquetadas
 *    cerradas; el motor L2-Physiology no interpreta payloads 'any'.
 * 2. SCENARIO-LOCAL ARMS: Las condiciones propias del escenario SVT
 *    (vagal_attempted, adenosine_given, ...) viven en el mismo sum
 *    type pero solo las tablas del escenario SVT las referencian.
 * 3. DELAYED EFFECTS: Los efectos diferidos se cristalizan como
 *    'PendingEffect' con 'execute_at_ms', drenados por el motor.
 *
 * # Mathematical Proof (Determinism):
 * La evaluación de reglas es una función pura de (estado extendido,
 * now). Toda aleatoriedad clínica (probabilidad de conversión con
 * adenosina, rebote de SVT) pertenece a los manejadores de tratamiento,
 * jamás a este contrato.
 * =================================================================
 */

use crate::extended::myocarditis::{AirwayMethod, InductionAgent, InotropeDrug};
use crate::extended::svt::SvtRhythm;
use crate::vitals::VitalsDelta;
use serde::{Deserialize, Serialize};

/// Prioridad de una línea de personaje o disparador.
/// El orden de declaración define la precedencia (Critical gana).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Normal,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Selector de droga inotrópica para condiciones de infusión.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InotropeSelector {
    Epi,
    Milrinone,
    Dobutamine,
    Dopamine,
    Norepi,
    /// Satisfecha cuando epinefrina Y milrinona corren en simultáneo.
    Both,
}

/// Operador lógico sobre el vector de condiciones de una regla.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLogic {
    All,
    Any,
}

impl Default for ConditionLogic {
    fn default() -> Self {
        ConditionLogic::All
    }
}

/// Condición declarativa evaluable contra el estado extendido y "now".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum RuleCondition {
    /// Volumen acumulado de fluidos dentro de una ventana móvil.
    FluidsMlKgInWindow { threshold_ml_kg: f64, window_minutes: f64 },
    /// Una infusión inotrópica específica (o ambas) está corriendo.
    InotropeRunning { drug: InotropeSelector },
    /// La dosis de una infusión alcanza o supera el umbral.
    InotropeDoseGte { drug: InotropeDrug, dose_mcg_kg_min: f64 },
    /// Se instaló una intervención de vía aérea del método dado.
    AirwayIntervention { method: AirwayMethod },
    /// La inducción de intubación usó el agente dado.
    IntubationInduction { agent: InductionAgent },
    /// Hay (o no hay) vasopresor preparado a pie de cama.
    PressorAtBedside { expected: bool },
    /// PEEP configurada mayor o igual al umbral (cmH₂O).
    PeepGte { centimeters_water: f64 },
    /// Estadio de shock mayor o igual al umbral (1-5).
    ShockStageGte { stage: u8 },
    /// Interconsulta ya convocada al servicio dado.
    ConsultCalled { service: String },
    /// Minutos transcurridos dentro de la fase actual.
    TimeInPhaseGte { minutes: f64 },
    /// Un diagnóstico del tipo dado fue ordenado.
    DiagnosticOrdered { test: String },

    // --- CONDICIONES LOCALES DEL ESCENARIO SVT ---
    /// Al menos una maniobra vagal fue intentada.
    VagalAttempted,
    /// El ritmo convirtió (o no) a sinusal.
    Converted { expected: bool },
    /// La dosis de adenosina numerada fue administrada.
    AdenosineGiven { dose_number: u8 },
    /// Al menos una cardioversión fue ejecutada.
    CardioversionPerformed,
    /// El ritmo actual coincide con el esperado.
    RhythmIs { rhythm: SvtRhythm },
    /// Nivel de estabilidad mayor o igual al umbral (1-4).
    StabilityLevelGte { level: u8 },
}

/// Efecto declarativo producido por una regla satisfecha.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum RuleEffect {
    /// Ajuste aditivo de signos vitales (agregado por pase).
    VitalsDelta { delta: VitalsDelta },
    /// Mutación de una bandera fisiológica nombrada.
    SetFlag { flag: String, value: bool },
    /// Línea hablada por la enfermera con prioridad de despacho.
    NurseLine {
        line: String,
        #[serde(default)]
        priority: Priority,
    },
    /// Avance del estadio de shock (el primero del pase gana).
    AdvanceShockStage { stage: u8 },
    /// Avance de fase del escenario (el primero del pase gana).
    AdvancePhase { phase_id: String },
    /// Activación del protocolo de paro (code blue).
    TriggerCodeBlue,
    /// Ajuste directo del nivel de estabilidad (escenario SVT).
    SetStabilityLevel { level: u8 },
}

/// Regla declarativa completa del motor de fisiología.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhysiologyRule {
    pub id: String,
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub condition_logic: ConditionLogic,
    pub effects: Vec<RuleEffect>,
    /// Diferimiento de efectos en segundos (encolados, no inmediatos).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<f64>,
    /// Ventana de enfriamiento entre disparos de la misma regla.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<f64>,
    /// Tope absoluto de disparos durante la vida de la sesión.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_triggers: Option<u32>,
}

/// Efecto diferido pendiente de drenaje por el motor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingEffect {
    pub rule_id: String,
    pub effect: RuleEffect,
    /// Epoch milisegundos a partir del cual el efecto es ejecutable.
    pub execute_at_ms: i64,
}

/// Registro contable de disparos de una regla.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RuleTriggerRecord {
    pub first_triggered_at_ms: i64,
    pub last_triggered_at_ms: i64,
    pub trigger_count: u32,
}
