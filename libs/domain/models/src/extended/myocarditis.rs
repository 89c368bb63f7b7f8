// [libs/domain/models/src/extended/myocarditis.rs]
/*!
 * =================================================================
 * APARATO: MYOCARDITIS EXTENDED STATE (V7.2 - FLUID LEDGER SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTABILIDAD DE SHOCK CARDIOGÉNICO PEDIÁTRICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FLUID LEDGER: 'total_fluids_ml_kg' se recalcula en cada bolo;
 *    el invariante (suma del vector ± 0.1 mL/kg) se sella aquí.
 * 2. AIRWAY TRAP: La intervención de vía aérea transporta el agente
 *    de inducción y la preparación de vasopresor para que las reglas
 *    del colapso post-intubación sean funciones puras del estado.
 * =================================================================
 */

use crate::extended::{ScoringState, TimelineEvent};
use crate::rules::{PendingEffect, RuleTriggerRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typeshare::typeshare;

/// Fases del arco clínico del escenario de miocarditis.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MyoPhase {
    SceneSet,
    Recognition,
    Decompensation,
    IntubationTrap,
    ConfirmationDisposition,
    End,
}

/// Tipo de fluido de un bolo de volumen.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FluidType {
    #[serde(rename = "NS")]
    NormalSaline,
    #[serde(rename = "LR")]
    LactatedRingers,
    #[serde(rename = "albumin")]
    Albumin,
    #[serde(rename = "blood")]
    Blood,
}

/// Registro de un bolo de fluido administrado.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidBolus {
    pub ml_per_kg: f64,
    pub total_ml: f64,
    pub fluid_type: FluidType,
    /// Minutos de infusión cuando el bolo no fue en empuje.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_minutes: Option<f64>,
    #[typeshare(serialized_as = "number")]
    pub given_at: i64,
}

/// Droga inotrópica/vasoactiva soportada por el escenario.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InotropeDrug {
    Epi,
    Milrinone,
    Dobutamine,
    Dopamine,
    Norepi,
}

/// Infusión inotrópica con su ciclo de vida.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InotropeInfusion {
    pub drug: InotropeDrug,
    pub dose_mcg_kg_min: f64,
    #[typeshare(serialized_as = "number")]
    pub started_at: i64,
    #[typeshare(serialized_as = "number")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<i64>,
}

impl InotropeInfusion {
    /// Verdadero mientras la infusión sigue corriendo.
    pub fn is_running(&self) -> bool {
        self.stopped_at.is_none()
    }
}

/// Método de soporte de vía aérea.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AirwayMethod {
    Hfnc,
    Intubation,
}

/// Agente de inducción para la secuencia de intubación.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InductionAgent {
    Ketamine,
    Propofol,
    Etomidate,
}

/// Intervención de vía aérea instalada con sus parámetros.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirwayIntervention {
    pub method: AirwayMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub induction_agent: Option<InductionAgent>,
    /// PEEP en cmH₂O, sellada al rango [0, 30].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peep_cm_h2o: Option<f64>,
    /// FiO₂ fraccional, sellada al rango [0.21, 1.0].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fio2_fraction: Option<f64>,
    pub pressor_ready: bool,
    pub push_dose_epi_drawn: bool,
    #[typeshare(serialized_as = "number")]
    pub performed_at: i64,
}

/// Diagnóstico ordenado dentro del escenario (eco, troponina, ...).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticOrder {
    pub test: String,
    #[typeshare(serialized_as = "number")]
    pub ordered_at: i64,
    #[typeshare(serialized_as = "number")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_text: Option<String>,
}

/// Banderas fisiológicas mutadas por reglas y tratamientos.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PhysiologyFlags {
    pub pulmonary_edema: bool,
    pub intubation_collapse: bool,
    pub code_blue_active: bool,
    pub stabilizing: bool,
}

/// Estado extendido completo del escenario de miocarditis pediátrica.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MyocarditisExtendedState {
    pub phase: MyoPhase,
    /// Epoch milisegundos de entrada a la fase vigente.
    #[typeshare(serialized_as = "number")]
    pub phase_entered_at: i64,
    /// Estadio de shock cardiovascular (1 compensado .. 5 paro).
    pub shock_stage: u8,
    /// Multiplicador de deterioro ∈ {0.5, 1.0, 2.0}.
    pub deterioration_rate: f64,

    // --- LEDGER DE VOLUMEN ---
    pub fluids: Vec<FluidBolus>,
    /// Suma sellada del vector de bolos (invariante ± 0.1 mL/kg).
    pub total_fluids_ml_kg: f64,

    pub inotropes: Vec<InotropeInfusion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airway: Option<AirwayIntervention>,
    pub diagnostics: Vec<DiagnosticOrder>,

    // --- ACCESOS Y MONITOREO ---
    pub iv_count: u32,
    pub iv_locations: Vec<String>,
    pub monitor_on: bool,
    pub defib_pads_on: bool,

    pub consults_called: Vec<String>,
    pub flags: PhysiologyFlags,
    pub scoring: ScoringState,
    pub timeline: Vec<TimelineEvent>,
    #[typeshare(skip)]
    pub pending_effects: Vec<PendingEffect>,
    #[typeshare(skip)]
    pub rule_triggers: HashMap<String, RuleTriggerRecord>,
}

impl MyocarditisExtendedState {
    /// Estado inicial de escena (shock aún silente).
    pub fn initial() -> Self {
        Self {
            phase: MyoPhase::SceneSet,
            phase_entered_at: 0,
            shock_stage: 1,
            deterioration_rate: 1.0,
            fluids: Vec::new(),
            total_fluids_ml_kg: 0.0,
            inotropes: Vec::new(),
            airway: None,
            diagnostics: Vec::new(),
            iv_count: 0,
            iv_locations: Vec::new(),
            monitor_on: false,
            defib_pads_on: false,
            consults_called: Vec::new(),
            flags: PhysiologyFlags::default(),
            scoring: ScoringState::default(),
            timeline: Vec::new(),
            pending_effects: Vec::new(),
            rule_triggers: HashMap::new(),
        }
    }

    /**
     * Registra un bolo y recalcula el total sellado desde el vector.
     * Recalcular (en vez de acumular) mantiene el invariante de suma
     * inmune a errores de redondeo acumulado.
     */
    pub fn record_fluid_bolus(&mut self, bolus: FluidBolus) {
        self.fluids.push(bolus);
        self.total_fluids_ml_kg = self.fluids.iter().map(|entry| entry.ml_per_kg).sum();
    }

    /// Volumen administrado dentro de la ventana móvil (mL/kg).
    pub fn fluids_ml_kg_in_window(&self, window_minutes: f64, now_ms: i64) -> f64 {
        let window_start = now_ms - (window_minutes * 60_000.0) as i64;
        self.fluids
            .iter()
            .filter(|bolus| bolus.given_at >= window_start)
            .map(|bolus| bolus.ml_per_kg)
            .sum()
    }

    /// Infusión corriente de la droga dada, si existe.
    pub fn running_infusion(&self, drug: InotropeDrug) -> Option<&InotropeInfusion> {
        self.inotropes
            .iter()
            .find(|infusion| infusion.drug == drug && infusion.is_running())
    }

    /// Avanza el estadio de shock sin retroceder jamás.
    pub fn advance_shock_stage(&mut self, target_stage: u8) -> bool {
        let sealed_target = target_stage.clamp(1, 5);
        if sealed_target > self.shock_stage {
            self.shock_stage = sealed_target;
            return true;
        }
        false
    }

    /// Registra una interconsulta una sola vez.
    pub fn record_consult(&mut self, service: &str) -> bool {
        if self.consults_called.iter().any(|existing| existing == service) {
            return false;
        }
        self.consults_called.push(service.to_string());
        true
    }
}
