// [libs/domain/models/src/extended/svt.rs]
/*!
 * =================================================================
 * APARATO: SVT EXTENDED STATE (V6.1 - TREATMENT LEDGER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTABILIDAD DE TRATAMIENTOS DEL ESCENARIO SVT
 *
 * # Mathematical Proof (Dose Accounting):
 * El vector de dosis de adenosina está acotado a 2 entradas numeradas
 * {1, 2}. El método de conversión registrado es función del último
 * tratamiento efectivo, garantizando trazabilidad 1:1 entre acción
 * clínica y desenlace hemodinámico.
 * =================================================================
 */

use crate::extended::{ScoringState, TimelineEvent};
use crate::rules::{PendingEffect, RuleTriggerRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typeshare::typeshare;

/// Fases del arco clínico del escenario SVT.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SvtPhase {
    Presentation,
    SvtOnset,
    TreatmentWindow,
    CardioversionDecision,
    Decompensating,
    Converted,
}

/// Ritmo vigente del corazón simulado.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SvtRhythm {
    Sinus,
    Svt,
}

/// Método que logró la conversión a ritmo sinusal.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMethod {
    Vagal,
    AdenosineFirst,
    AdenosineSecond,
    Cardioversion,
}

/// Registro de una dosis de adenosina administrada.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdenosineDose {
    /// Número de dosis (1 o 2).
    pub dose_number: u8,
    pub dose_milligrams: f64,
    pub dose_mg_per_kg: f64,
    /// Empuje rápido (requisito de eficacia farmacológica).
    pub rapid_push: bool,
    pub flush_given: bool,
    #[typeshare(serialized_as = "number")]
    pub given_at: i64,
}

/// Registro de un intento de cardioversión sincronizada.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardioversionAttempt {
    pub joules: f64,
    pub joules_per_kg: f64,
    pub synchronized: bool,
    pub sedation_given: bool,
    #[typeshare(serialized_as = "number")]
    pub performed_at: i64,
}

/// Estado extendido completo del escenario SVT adolescente.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SvtExtendedState {
    pub phase: SvtPhase,
    /// Epoch milisegundos de entrada a la fase vigente.
    #[typeshare(serialized_as = "number")]
    pub phase_entered_at: i64,
    /// Nivel de estabilidad hemodinámica (1 estable .. 4 crítico).
    pub stability_level: u8,
    pub current_rhythm: SvtRhythm,
    pub converted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_method: Option<ConversionMethod>,

    // --- CONTABILIDAD DE TRATAMIENTOS ---
    pub vagal_attempts: u32,
    #[typeshare(serialized_as = "number")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_vagal_at: Option<i64>,
    /// Dosis de adenosina (a lo sumo 2, numeradas 1 y 2).
    pub adenosine_doses: Vec<AdenosineDose>,
    pub cardioversion_attempts: Vec<CardioversionAttempt>,

    // --- BANDERAS DE INTERVENCIÓN ---
    pub iv_access: bool,
    pub monitor_on: bool,
    pub sedation_given: bool,
    pub ecg_ordered: bool,

    pub consults_called: Vec<String>,
    pub scoring: ScoringState,
    pub timeline: Vec<TimelineEvent>,
    #[typeshare(skip)]
    pub pending_effects: Vec<PendingEffect>,
    #[typeshare(skip)]
    pub rule_triggers: HashMap<String, RuleTriggerRecord>,
}

impl SvtExtendedState {
    /// Estado inicial de presentación (taquicardia aún no instalada).
    pub fn initial() -> Self {
        Self {
            phase: SvtPhase::Presentation,
            phase_entered_at: 0,
            stability_level: 1,
            current_rhythm: SvtRhythm::Sinus,
            converted: false,
            conversion_method: None,
            vagal_attempts: 0,
            last_vagal_at: None,
            adenosine_doses: Vec::new(),
            cardioversion_attempts: Vec::new(),
            iv_access: false,
            monitor_on: false,
            sedation_given: false,
            ecg_ordered: false,
            consults_called: Vec::new(),
            scoring: ScoringState::default(),
            timeline: Vec::new(),
            pending_effects: Vec::new(),
            rule_triggers: HashMap::new(),
        }
    }

    /// Número de la próxima dosis de adenosina (None si ya van 2).
    pub fn next_adenosine_dose_number(&self) -> Option<u8> {
        match self.adenosine_doses.len() {
            0 => Some(1),
            1 => Some(2),
            _ => None,
        }
    }

    /**
     * Sella la conversión a ritmo sinusal con su método causal.
     * Idempotente: una conversión ya registrada no se sobreescribe.
     */
    pub fn mark_converted(&mut self, method: ConversionMethod) {
        if self.converted {
            return;
        }
        self.converted = true;
        self.conversion_method = Some(method);
        self.current_rhythm = SvtRhythm::Sinus;
        self.phase = SvtPhase::Converted;
        self.stability_level = 1;
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
